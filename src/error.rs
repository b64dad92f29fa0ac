//! Custom error types for the instrument drivers.
//!
//! All driver operations return [`InstrumentError`], a small closed set of
//! variants so callers can branch on error kind rather than message content:
//!
//! - **`InvalidArgument`**: a precondition failure (e.g. a trace index outside
//!   1..=3) detected before any instrument I/O takes place.
//! - **`Communication`**: a transport-level failure (timeout, disconnection)
//!   while talking to the instrument, or a scalar reply that could not be
//!   parsed as a number. Never retried internally; surfaced to the caller who
//!   decides whether to retry.
//! - **`MalformedBlock`**: a framing, length, or alignment problem in a binary
//!   trace block. The partially parsed block is discarded entirely.
//! - **`Config`** / **`Io`**: configuration-file and startup I/O problems,
//!   wrapped via `#[from]` so the `?` operator works throughout.
//!
//! No error is fatal to the process: each call is independent and a failed
//! operation does not poison subsequent ones.

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type Result<T> = std::result::Result<T, InstrumentError>;

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Instrument communication error: {0}")]
    Communication(String),

    #[error("Malformed binary block: {0}")]
    MalformedBlock(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
