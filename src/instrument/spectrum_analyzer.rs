//! HP E4407B spectrum analyzer driver.
//!
//! The centerpiece is [`SpectrumAnalyzer::get_trace`], which pulls one sweep
//! out of the instrument's trace buffer as 32-bit binary data and reconstructs
//! the frequency axis from the separately queried start frequency and span.
//! Everything else is a thin SCPI mapping over the shared session.
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo() -> gpib_instruments::Result<()> {
//! # let session: gpib_instruments::SharedSession<gpib_instruments::session::mock::MockSession> = todo!();
//! use gpib_instruments::SpectrumAnalyzer;
//!
//! let sa = SpectrumAnalyzer::new("sa_1", session);
//! let trace = sa.get_trace(1).await?;
//! for (i, dbm) in trace.samples.iter().enumerate() {
//!     println!("{} Hz: {} dBm", trace.start_hz + i as f64 * trace.step_hz, dbm);
//! }
//! # Ok(())
//! # }
//! ```

use log::{debug, info};

use crate::block;
use crate::error::{InstrumentError, Result};
use crate::session::{GpibSession, SharedSession};

/// One decoded sweep with its frequency axis.
///
/// `samples` is ordered; sample `i` sits at `start_hz + i * step_hz`. The step
/// follows the instrument's first-to-last convention, `span / (n - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub start_hz: f64,
    pub step_hz: f64,
    pub samples: Vec<f64>,
}

/// Amplitude axis spacing (`DISP:WIND:TRAC:Y:SPAC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YScale {
    Linear,
    Logarithmic,
}

impl YScale {
    fn as_scpi(self) -> &'static str {
        match self {
            YScale::Linear => "LIN",
            YScale::Logarithmic => "LOG",
        }
    }
}

/// Detector mode (`:DET`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    Sample,
    PositivePeak,
    NegativePeak,
}

impl Detector {
    fn as_scpi(self) -> &'static str {
        match self {
            Detector::Sample => "SAMP",
            Detector::PositivePeak => "POS",
            Detector::NegativePeak => "NEG",
        }
    }
}

/// Sweep trigger source (`:TRIG:SOUR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    FreeRun,
    Video,
    PowerLine,
    External,
}

impl TriggerSource {
    fn as_scpi(self) -> &'static str {
        match self {
            TriggerSource::FreeRun => "IMM",
            TriggerSource::Video => "VID",
            TriggerSource::PowerLine => "LINE",
            TriggerSource::External => "EXT",
        }
    }
}

/// HP E4407B spectrum analyzer.
pub struct SpectrumAnalyzer<S: GpibSession> {
    id: String,
    session: SharedSession<S>,
}

impl<S: GpibSession> SpectrumAnalyzer<S> {
    pub fn new(id: &str, session: SharedSession<S>) -> Self {
        Self {
            id: id.to_string(),
            session,
        }
    }

    pub fn name(&self) -> &str {
        &self.id
    }

    fn check_trace_index(trace: u8) -> Result<()> {
        if (1..=3).contains(&trace) {
            Ok(())
        } else {
            Err(InstrumentError::InvalidArgument(format!(
                "trace index {trace} out of range 1..=3"
            )))
        }
    }

    async fn query_f64(session: &mut S, command: &str) -> Result<f64> {
        let reply = session.query(command).await?;
        reply.trim().parse().map_err(|_| {
            InstrumentError::Communication(format!(
                "unparseable numeric reply '{}' to '{command}'",
                reply.trim()
            ))
        })
    }

    /// Fetches and decodes one trace from the instrument's buffer.
    ///
    /// Issues three queries under a single session lock: start frequency,
    /// span, then the binary trace query. The output format (`INT,32`, normal
    /// byte order) is re-negotiated on every call because the instrument's
    /// format mode is volatile state; setting it repeatedly is safe.
    ///
    /// A trace with fewer than two samples has no defined frequency step and
    /// fails rather than dividing by zero.
    pub async fn get_trace(&self, trace: u8) -> Result<Trace> {
        Self::check_trace_index(trace)?;

        let mut session = self.session.lock().await;
        let start_hz = Self::query_f64(&mut session, ":FREQ:STAR?").await?;
        let span_hz = Self::query_f64(&mut session, ":FREQ:SPAN?").await?;
        session.write(":FORM INT,32").await?;
        session.write(":FORM:BORD NORM").await?;
        let raw = session.query_raw(&format!(":TRAC? TRACE{trace}")).await?;
        drop(session);

        let samples = block::decode_block(&raw)?;
        let n = samples.len();
        if n <= 1 {
            return Err(InstrumentError::MalformedBlock(format!(
                "trace has {n} sample(s), cannot derive a frequency step"
            )));
        }
        // Step between first and last sample, not bin width. Existing callers
        // rely on this convention.
        let step_hz = span_hz / (n - 1) as f64;
        debug!(
            "[{}] trace {trace}: {n} samples, start {start_hz} Hz, step {step_hz} Hz",
            self.id
        );
        Ok(Trace {
            start_hz,
            step_hz,
            samples,
        })
    }

    /// Queries the instrument identification string.
    pub async fn identify(&self) -> Result<String> {
        let reply = self.session.lock().await.query("*IDN?").await?;
        Ok(reply.trim().to_string())
    }

    /// Marker frequency of the peak detector, in Hz.
    pub async fn peak_frequency(&self) -> Result<f64> {
        let mut session = self.session.lock().await;
        Self::query_f64(&mut session, ":CALC:MARK:X?").await
    }

    /// Marker amplitude of the peak detector, in dBm.
    pub async fn peak_amplitude(&self) -> Result<f64> {
        let mut session = self.session.lock().await;
        Self::query_f64(&mut session, ":CALC:MARK:Y?").await
    }

    /// Mean amplitude over an entire trace, in dBm.
    pub async fn average_amplitude(&self, trace: u8) -> Result<f64> {
        Self::check_trace_index(trace)?;
        let mut session = self.session.lock().await;
        Self::query_f64(&mut session, &format!(":TRAC:MATH:MEAN? TRACE{trace}")).await
    }

    /// Sets the number of points per sweep.
    pub async fn set_num_points(&self, n: u32) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":SWE:POIN {n}"))
            .await
    }

    /// Sets the center frequency, in MHz.
    pub async fn set_center_frequency_mhz(&self, mhz: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":FREQ:CENT {mhz}MHz"))
            .await
    }

    /// Sets the frequency span, in MHz.
    pub async fn set_span_mhz(&self, mhz: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":FREQ:SPAN {mhz}MHz"))
            .await
    }

    /// Sets the sweep start frequency, in MHz.
    pub async fn set_start_frequency_mhz(&self, mhz: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":FREQ:STAR {mhz}MHz"))
            .await
    }

    /// Sets the sweep stop frequency, in MHz.
    pub async fn set_stop_frequency_mhz(&self, mhz: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":FREQ:STOP {mhz}MHz"))
            .await
    }

    /// Sets the resolution bandwidth, in MHz.
    pub async fn set_resolution_bandwidth_mhz(&self, mhz: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":BAND {mhz}MHz"))
            .await
    }

    /// Sets the video bandwidth, in kHz.
    pub async fn set_video_bandwidth_khz(&self, khz: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":BAND:VID {khz}kHz"))
            .await
    }

    /// Sets the amplitude axis to linear or logarithmic spacing.
    pub async fn set_y_scale(&self, scale: YScale) -> Result<()> {
        info!("[{}] Y scale -> {}", self.id, scale.as_scpi());
        self.session
            .lock()
            .await
            .write(&format!("DISP:WIND:TRAC:Y:SPAC {}", scale.as_scpi()))
            .await
    }

    /// Sets the reference level, in dBm.
    pub async fn set_reference_level_dbm(&self, dbm: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!("DISP:WIND:TRAC:Y:RLEV {dbm}dBm"))
            .await
    }

    /// Sets the sweep time, in ms.
    pub async fn set_sweep_time_ms(&self, ms: f64) -> Result<()> {
        self.session
            .lock()
            .await
            .write(&format!(":SWE:TIME {ms}ms"))
            .await
    }

    /// Selects the detector mode.
    pub async fn set_detector(&self, detector: Detector) -> Result<()> {
        info!("[{}] detector -> {}", self.id, detector.as_scpi());
        self.session
            .lock()
            .await
            .write(&format!(":DET {}", detector.as_scpi()))
            .await
    }

    /// Selects the sweep trigger source.
    pub async fn set_trigger_source(&self, source: TriggerSource) -> Result<()> {
        info!("[{}] trigger source -> {}", self.id, source.as_scpi());
        self.session
            .lock()
            .await
            .write(&format!(":TRIG:SOUR {}", source.as_scpi()))
            .await
    }

    /// Turns trace averaging on or off.
    pub async fn set_averaging(&self, on: bool) -> Result<()> {
        let setting = if on { "ON" } else { "OFF" };
        self.session
            .lock()
            .await
            .write(&format!(":AVER {setting}"))
            .await
    }
}
