//! Instrument drivers.

pub mod dc_source;
pub mod spectrum_analyzer;
