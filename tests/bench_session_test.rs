//! End-to-end driver tests over a scripted mock session.
//!
//! Exercises both drivers the way a measurement script would: configure the
//! supply, set up the sweep, fetch a trace, and check that the exact SCPI
//! traffic reached the (mock) instrument.

use gpib_instruments::session::mock::MockSession;
use tokio_test::assert_ok;
use gpib_instruments::{DcSource, InstrumentError, SharedSession, SpectrumAnalyzer};

fn trace_block(values: &[i32]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    let len = payload.len().to_string();
    let mut raw = format!("#{}{}", len.len(), len).into_bytes();
    raw.extend_from_slice(&payload);
    raw
}

#[tokio::test]
async fn test_sweep_measurement_scenario() {
    let mock = MockSession::new()
        .with_reply("*IDN?", "Hewlett-Packard, E4407B, MY12345678, A.14.01\n")
        .with_reply(":FREQ:STAR?", "950000000\n")
        .with_reply(":FREQ:SPAN?", "100000000\n")
        .with_reply(
            ":TRAC? TRACE1",
            trace_block(&[-30_000, -29_500, -12_250, -29_750, -30_250]),
        );
    let session = SharedSession::new(mock);
    let analyzer = SpectrumAnalyzer::new("sa", session.clone());

    let idn = analyzer.identify().await.unwrap();
    assert!(idn.starts_with("Hewlett-Packard"));

    tokio_test::assert_ok!(analyzer.set_center_frequency_mhz(1000.0).await);
    tokio_test::assert_ok!(analyzer.set_span_mhz(100.0).await);
    tokio_test::assert_ok!(analyzer.set_num_points(5).await);

    let trace = analyzer.get_trace(1).await.unwrap();
    assert_eq!(trace.start_hz, 9.5e8);
    assert_eq!(trace.step_hz, 2.5e7);
    assert_eq!(trace.samples, vec![-30.0, -29.5, -12.25, -29.75, -30.25]);

    // Peak sits in the middle of the sweep.
    let (peak_index, _) = trace
        .samples
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap();
    assert_eq!(trace.start_hz + peak_index as f64 * trace.step_hz, 1e9);

    let commands = session.lock().await.commands().to_vec();
    assert_eq!(
        commands,
        vec![
            "*IDN?",
            ":FREQ:CENT 1000MHz",
            ":FREQ:SPAN 100MHz",
            ":SWE:POIN 5",
            ":FREQ:STAR?",
            ":FREQ:SPAN?",
            ":FORM INT,32",
            ":FORM:BORD NORM",
            ":TRAC? TRACE1",
        ]
    );
}

#[tokio::test]
async fn test_supply_bring_up_scenario() {
    let mock = MockSession::new()
        .with_reply("*IDN?", "Agilent Technologies, E3640A, 0, 1.7-5.0-1.0\n")
        .with_reply("MEAS:VOLT?", "3.299\n")
        .with_reply("MEAS:CURR?", "0.1502\n")
        .with_reply("OUTP?", "1\n");
    let session = SharedSession::new(mock);
    let psu = DcSource::new("psu", session.clone());

    assert!(psu.identify().await.unwrap().starts_with("Agilent"));
    assert_eq!(psu.set_voltage(3.3).await.unwrap(), 3.299);
    assert_eq!(psu.set_current(0.15).await.unwrap(), 0.1502);
    psu.set_output(true).await.unwrap();
    assert!(psu.output().await.unwrap());

    let commands = session.lock().await.commands().to_vec();
    assert_eq!(
        commands,
        vec![
            "*IDN?",
            "VOLT 3.3",
            "MEAS:VOLT?",
            "CURR 0.15",
            "MEAS:CURR?",
            "OUTP 1",
            "OUTP?",
        ]
    );
}

#[tokio::test]
async fn test_failed_fetch_does_not_poison_later_calls() {
    let mock = MockSession::new()
        .with_reply(":FREQ:STAR?", "0\n")
        .with_reply(":FREQ:SPAN?", "1000\n")
        .with_reply(":TRAC? TRACE1", trace_block(&[1000, 2000]))
        .with_reply(":TRAC? TRACE2", &b"#9"[..]);
    let session = SharedSession::new(mock);
    let analyzer = SpectrumAnalyzer::new("sa", session);

    let err = analyzer.get_trace(2).await.unwrap_err();
    assert!(matches!(err, InstrumentError::MalformedBlock(_)));

    let trace = analyzer.get_trace(1).await.unwrap();
    assert_eq!(trace.samples, vec![1.0, 2.0]);
}

#[tokio::test]
async fn test_concurrent_fetches_are_serialized() {
    // Both tasks share one session; the lock keeps their five-command
    // sequences contiguous instead of interleaved.
    let mock = MockSession::new()
        .with_reply(":FREQ:STAR?", "0\n")
        .with_reply(":FREQ:SPAN?", "1000\n")
        .with_reply(":TRAC? TRACE1", trace_block(&[1, 2]));
    let session = SharedSession::new(mock);
    let analyzer = std::sync::Arc::new(SpectrumAnalyzer::new("sa", session.clone()));

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let analyzer = std::sync::Arc::clone(&analyzer);
            tokio::spawn(async move { analyzer.get_trace(1).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let commands = session.lock().await.commands().to_vec();
    assert_eq!(commands.len(), 10);
    for sequence in commands.chunks(5) {
        assert_eq!(
            sequence,
            [
                ":FREQ:STAR?",
                ":FREQ:SPAN?",
                ":FORM INT,32",
                ":FORM:BORD NORM",
                ":TRAC? TRACE1",
            ]
        );
    }
}
