//! SCPI drivers for GPIB-attached lab instruments.
//!
//! This library translates typed method calls into SCPI text commands for two
//! pieces of bench hardware and turns the replies back into typed values:
//!
//! - [`DcSource`] — Agilent E3640A DC power supply (output state, current,
//!   voltage).
//! - [`SpectrumAnalyzer`] — HP E4407B spectrum analyzer, including retrieval
//!   of a full sweep as a decoded [`Trace`] with a calibrated frequency axis.
//!
//! Instrument I/O goes through the [`GpibSession`] trait so that drivers can
//! run against real VISA hardware (enable the `instrument_visa` feature) or a
//! scripted [`session::mock::MockSession`] in tests. A [`SharedSession`]
//! serializes access to one physical instrument: multi-query operations hold
//! its lock for their whole command sequence.

pub mod block;
pub mod config;
pub mod error;
pub mod instrument;
pub mod session;

pub use error::{InstrumentError, Result};
pub use instrument::dc_source::DcSource;
pub use instrument::spectrum_analyzer::{SpectrumAnalyzer, Trace};
pub use session::{GpibSession, SharedSession};
