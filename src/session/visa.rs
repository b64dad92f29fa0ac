//! VISA-backed session implementation.
//!
//! Talks to real hardware through the `visa-rs` crate. The GPIB address comes
//! from a VISA resource string such as `GPIB0::19::INSTR`, typically taken
//! from the `[instruments.<id>]` table in `config/default.toml`:
//!
//! ```toml
//! [instruments.spectrum_analyzer]
//! resource_string = "GPIB0::18::INSTR"
//! ```

use std::ffi::CString;
use std::io::{Read, Write};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use log::{debug, info};
use visa_rs::prelude::*;

use crate::error::{InstrumentError, Result};
use crate::session::GpibSession;

const READ_CHUNK: usize = 4096;

/// A [`GpibSession`] over a VISA instrument session.
pub struct VisaSession {
    resource: String,
    // The resource manager must outlive the session it opened.
    _rm: DefaultRM,
    session: Instrument,
}

fn visa_err(e: impl std::fmt::Display) -> InstrumentError {
    InstrumentError::Communication(e.to_string())
}

impl VisaSession {
    /// Opens the instrument at the given VISA resource string.
    pub fn open(resource: &str) -> Result<Self> {
        info!("Opening VISA session to {resource}");
        let rm = DefaultRM::new().map_err(visa_err)?;
        let c_string = CString::new(resource)
            .map_err(|_| InstrumentError::InvalidArgument(format!(
                "resource string '{resource}' contains a NUL byte"
            )))?;
        let visa_string = VisaString::from(c_string);
        let session = rm
            .open(&visa_string, AccessMode::NO_LOCK, TIMEOUT_IMMEDIATE)
            .map_err(visa_err)?;
        Ok(Self {
            resource: resource.to_string(),
            _rm: rm,
            session,
        })
    }

    fn send(&mut self, command: &str) -> Result<()> {
        debug!("[{}] -> {}", self.resource, command);
        self.session
            .write_all(command.as_bytes())
            .and_then(|()| self.session.write_all(b"\n"))
            .map_err(visa_err)
    }

    fn read_reply(&mut self) -> Result<Bytes> {
        let mut reply = BytesMut::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = self.session.read(&mut buf).map_err(visa_err)?;
            reply.extend_from_slice(&buf[..n]);
            // A short read means the instrument has finished its reply.
            if n < buf.len() {
                return Ok(reply.freeze());
            }
        }
    }
}

#[async_trait]
impl GpibSession for VisaSession {
    async fn query(&mut self, command: &str) -> Result<String> {
        self.send(command)?;
        let reply = self.read_reply()?;
        let text = String::from_utf8_lossy(&reply).trim_end().to_string();
        debug!("[{}] <- {}", self.resource, text);
        Ok(text)
    }

    async fn query_raw(&mut self, command: &str) -> Result<Bytes> {
        self.send(command)?;
        let mut reply = self.read_reply()?;
        // Strip the response termination character, which is not part of the
        // binary block.
        if reply.last() == Some(&b'\n') {
            reply.truncate(reply.len() - 1);
        }
        debug!("[{}] <- {} raw bytes", self.resource, reply.len());
        Ok(reply)
    }

    async fn write(&mut self, command: &str) -> Result<()> {
        self.send(command)
    }
}
