//! A mock session with scripted replies, for driver tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{InstrumentError, Result};
use crate::session::GpibSession;

/// A [`GpibSession`] that answers queries from a scripted reply table and
/// records every command it receives.
///
/// Unscripted queries and commands scripted with [`failing`](Self::failing)
/// return [`InstrumentError::Communication`], which lets tests exercise the
/// propagation path without hardware.
#[derive(Default)]
pub struct MockSession {
    replies: HashMap<String, Bytes>,
    failures: HashSet<String>,
    commands: Vec<String>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a reply for the given command.
    #[must_use]
    pub fn with_reply(mut self, command: &str, reply: impl Into<Bytes>) -> Self {
        self.replies.insert(command.to_string(), reply.into());
        self
    }

    /// Scripts a transport failure for the given command.
    #[must_use]
    pub fn failing(mut self, command: &str) -> Self {
        self.failures.insert(command.to_string());
        self
    }

    /// Every command sent so far, queries and writes alike, in order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    fn respond(&mut self, command: &str) -> Result<Bytes> {
        self.commands.push(command.to_string());
        if self.failures.contains(command) {
            return Err(InstrumentError::Communication(format!(
                "mock transport failure for '{command}'"
            )));
        }
        self.replies.get(command).cloned().ok_or_else(|| {
            InstrumentError::Communication(format!("mock has no reply scripted for '{command}'"))
        })
    }
}

#[async_trait]
impl GpibSession for MockSession {
    async fn query(&mut self, command: &str) -> Result<String> {
        let reply = self.respond(command)?;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    async fn query_raw(&mut self, command: &str) -> Result<Bytes> {
        self.respond(command)
    }

    async fn write(&mut self, command: &str) -> Result<()> {
        self.commands.push(command.to_string());
        if self.failures.contains(command) {
            return Err(InstrumentError::Communication(format!(
                "mock transport failure for '{command}'"
            )));
        }
        Ok(())
    }
}
