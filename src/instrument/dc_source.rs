//! Agilent E3640A DC power supply driver.
//!
//! Pure command forwarding: every operation writes a formatted SCPI string or
//! issues a query and parses the scalar reply. Setters for current and
//! voltage return the measured value afterwards, which may differ from the
//! set level if the output is off or the supply is limiting.

use log::info;

use crate::error::{InstrumentError, Result};
use crate::session::{GpibSession, SharedSession};

/// Agilent E3640A DC power supply.
pub struct DcSource<S: GpibSession> {
    id: String,
    session: SharedSession<S>,
}

impl<S: GpibSession> DcSource<S> {
    pub fn new(id: &str, session: SharedSession<S>) -> Self {
        Self {
            id: id.to_string(),
            session,
        }
    }

    pub fn name(&self) -> &str {
        &self.id
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

    /// Queries the instrument identification string.
    pub async fn identify(&self) -> Result<String> {
        let reply = self.session.lock().await.query("*IDN?").await?;
        Ok(reply.trim().to_string())
    }

    /// Whether the output is enabled.
    pub async fn output(&self) -> Result<bool> {
        let reply = self.session.lock().await.query("OUTP?").await?;
        match reply.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(InstrumentError::Communication(format!(
                "unexpected reply '{other}' to 'OUTP?'"
            ))),
        }
    }

    /// Enables or disables the output.
    pub async fn set_output(&self, on: bool) -> Result<()> {
        info!("[{}] output -> {}", self.id, if on { "on" } else { "off" });
        self.session
            .lock()
            .await
            .write(&format!("OUTP {}", u8::from(on)))
            .await
    }

    /// Sets the current level and returns the measured output current, in A.
    pub async fn set_current(&self, amps: f64) -> Result<f64> {
        let mut session = self.session.lock().await;
        session.write(&format!("CURR {amps}")).await?;
        Self::query_f64(&mut session, "MEAS:CURR?").await
    }

    /// Measured output current, in A.
    pub async fn measure_current(&self) -> Result<f64> {
        let mut session = self.session.lock().await;
        Self::query_f64(&mut session, "MEAS:CURR?").await
    }

    /// Sets the voltage level and returns the measured output voltage, in V.
    pub async fn set_voltage(&self, volts: f64) -> Result<f64> {
        let mut session = self.session.lock().await;
        session.write(&format!("VOLT {volts}")).await?;
        Self::query_f64(&mut session, "MEAS:VOLT?").await
    }

    /// Measured output voltage, in V.
    pub async fn measure_voltage(&self) -> Result<f64> {
        let mut session = self.session.lock().await;
        Self::query_f64(&mut session, "MEAS:VOLT?").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::MockSession;
    use tokio_test::assert_ok;

    fn source(mock: MockSession) -> (DcSource<MockSession>, SharedSession<MockSession>) {
        let session = SharedSession::new(mock);
        (DcSource::new("psu_test", session.clone()), session)
    }

    #[tokio::test]
    async fn test_output_round_trip() {
        let mock = MockSession::new().with_reply("OUTP?", "1\n");
        let (psu, session) = source(mock);

        tokio_test::assert_ok!(psu.set_output(true).await);
        assert!(psu.output().await.unwrap());
        assert_eq!(
            session.lock().await.commands(),
            ["OUTP 1", "OUTP?"]
        );
    }

    #[tokio::test]
    async fn test_set_current_returns_measured_value() {
        // Supply is voltage-limited; measured current differs from the set level.
        let mock = MockSession::new().with_reply("MEAS:CURR?", "1.4562E-1\n");
        let (psu, session) = source(mock);

        let measured = psu.set_current(0.25).await.unwrap();
        assert_eq!(measured, 0.14562);
        assert_eq!(
            session.lock().await.commands(),
            ["CURR 0.25", "MEAS:CURR?"]
        );
    }

    #[tokio::test]
    async fn test_set_voltage_returns_measured_value() {
        let mock = MockSession::new().with_reply("MEAS:VOLT?", "5.001\n");
        let (psu, session) = source(mock);

        let measured = psu.set_voltage(5.0).await.unwrap();
        assert_eq!(measured, 5.001);
        assert_eq!(
            session.lock().await.commands(),
            ["VOLT 5", "MEAS:VOLT?"]
        );
    }

    #[tokio::test]
    async fn test_unexpected_output_reply_is_communication_error() {
        let mock = MockSession::new().with_reply("OUTP?", "maybe\n");
        let (psu, _session) = source(mock);

        let err = psu.output().await.unwrap_err();
        assert!(matches!(err, InstrumentError::Communication(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let mock = MockSession::new().failing("MEAS:VOLT?");
        let (psu, _session) = source(mock);

        let err = psu.measure_voltage().await.unwrap_err();
        assert!(matches!(err, InstrumentError::Communication(_)));
    }
}
