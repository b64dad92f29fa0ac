//! Application configuration.
//!
//! Settings are loaded with the `config` crate from a TOML file plus `LAB_`
//! environment overrides. Instruments are keyed by id:
//!
//! ```toml
//! [instruments.spectrum_analyzer]
//! resource_string = "GPIB0::18::INSTR"
//!
//! [instruments.dc_source]
//! resource_string = "GPIB0::5::INSTR"
//! ```
//!
//! The library API itself takes sessions directly; `Settings` feeds the
//! VISA-backed path and the `trace_dump` tool.

use std::collections::HashMap;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    /// VISA resource string, e.g. `GPIB0::18::INSTR`.
    pub resource_string: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub instruments: HashMap<String, InstrumentConfig>,
}

impl Settings {
    /// Loads settings from the given file, or `config/default.toml` when none
    /// is given, with `LAB_*` environment variables layered on top.
    pub fn new(path: Option<&str>) -> Result<Self> {
        let builder = match path {
            Some(p) => Config::builder().add_source(File::with_name(p)),
            None => Config::builder().add_source(File::with_name("config/default").required(false)),
        };
        let cfg = builder
            .add_source(Environment::with_prefix("LAB").separator("__"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_default_file_yields_empty_settings() {
        let settings = Settings::new(None).unwrap();
        let _ = settings.instruments.len();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Settings::new(Some("/nonexistent/lab.toml")).unwrap_err();
        assert!(matches!(err, crate::error::InstrumentError::Config(_)));
    }
}
