//! Dump a spectrum-analyzer trace to stdout.
//!
//! Connects to the analyzer named in the config file over VISA, prints its
//! identification string, then fetches and prints one trace as
//! frequency/amplitude pairs.
//!
//! ```text
//! cargo run --bin trace_dump --features instrument_visa -- --trace 2
//! ```

use anyhow::{anyhow, Result};
use clap::Parser;
use gpib_instruments::config::Settings;
use gpib_instruments::session::visa::VisaSession;
use gpib_instruments::{SharedSession, SpectrumAnalyzer};

#[derive(Parser)]
#[command(about = "Fetch and print a spectrum analyzer trace")]
struct Args {
    /// Instrument id in the config file
    #[arg(long, default_value = "spectrum_analyzer")]
    instrument: String,

    /// Trace buffer to fetch (1, 2, or 3)
    #[arg(long, default_value_t = 1)]
    trace: u8,

    /// Path to a config file (defaults to config/default.toml)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = Settings::new(args.config.as_deref())?;
    let instrument = settings
        .instruments
        .get(&args.instrument)
        .ok_or_else(|| anyhow!("no configuration for instrument '{}'", args.instrument))?;

    let session = VisaSession::open(&instrument.resource_string)?;
    let analyzer = SpectrumAnalyzer::new(&args.instrument, SharedSession::new(session));

    println!("# {}", analyzer.identify().await?);
    let trace = analyzer.get_trace(args.trace).await?;
    println!(
        "# start {} Hz, step {} Hz, {} samples",
        trace.start_hz,
        trace.step_hz,
        trace.samples.len()
    );
    for (i, dbm) in trace.samples.iter().enumerate() {
        println!("{}\t{}", trace.start_hz + i as f64 * trace.step_hz, dbm);
    }
    Ok(())
}
