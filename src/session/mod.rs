//! Instrument session abstraction.
//!
//! A [`GpibSession`] is the transport collaborator the drivers talk through:
//! a blocking request/response `query`, a raw-bytes variant for commands whose
//! reply is a binary block, and a fire-and-forget `write`. Whether a reply is
//! text or a block is determined by the command sent, not negotiated here.
//!
//! Implementations:
//! - [`mock::MockSession`] — scripted replies with a command log, for tests.
//! - [`visa::VisaSession`] — real hardware over `visa-rs` (feature
//!   `instrument_visa`).

pub mod mock;
#[cfg(feature = "instrument_visa")]
pub mod visa;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::Result;

/// Request/response transport to a single GPIB-attached instrument.
#[async_trait]
pub trait GpibSession: Send {
    /// Sends a command and waits for its text reply.
    async fn query(&mut self, command: &str) -> Result<String>;

    /// Sends a command whose reply is a binary block, returned unparsed.
    async fn query_raw(&mut self, command: &str) -> Result<Bytes>;

    /// Sends a command with no reply.
    async fn write(&mut self, command: &str) -> Result<()>;
}

/// A session handle that serializes access to one physical instrument.
///
/// Two concurrent trace fetches against the same instrument would corrupt each
/// other through interleaved mode-setting and querying, so every multi-command
/// operation locks the session for its whole sequence. Cloning the handle
/// shares the same underlying session and lock.
pub struct SharedSession<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: GpibSession> SharedSession<S> {
    pub fn new(session: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Acquires exclusive use of the instrument for a command sequence.
    pub async fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock().await
    }
}
