//! Mindwire - live ThinkGear EEG stream decoder
//!
//! Reads the headset's serial byte stream, validates frames, and displays
//! smoothed attention, meditation, alpha, and beta values in real time.
//!
//! # Usage
//!
//! ```bash
//! # Stream from a headset
//! mindwire stream --port /dev/ttyUSB0
//!
//! # Stream simulated data (no hardware)
//! mindwire stream
//!
//! # List serial ports
//! mindwire devices
//! ```

use std::io::Write;

use clap::{Parser, Subcommand};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mindwire_core::{
    codes, decode_payload, read_frame, ByteSource, DataValue, SignalAggregator, SmoothingConfig,
};

mod serial;
mod simulate;

/// Mindwire EEG stream decoder
#[derive(Parser, Debug)]
#[command(name = "mindwire")]
#[command(author, version, about = "ThinkGear EEG headset stream decoder", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream smoothed signal values (default if no subcommand)
    Stream {
        /// Serial port path (e.g. /dev/ttyUSB0 or COM10); omit to simulate
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long, default_value = "57600")]
        baud: u32,

        /// Exponential smoothing factor, 0 < α ≤ 1
        #[arg(long, default_value = "0.2")]
        smoothing: f32,
    },

    /// List available serial ports
    Devices,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Mindwire v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Devices) => list_devices(),
        command => {
            let (port, baud, smoothing) = match command {
                Some(Commands::Stream { port, baud, smoothing }) => (port, baud, smoothing),
                _ => (None, 57_600, 0.2),
            };
            run_stream(port, baud, smoothing)
        }
    }
}

/// Connect a byte source and run the display loop over it.
fn run_stream(port: Option<String>, baud: u32, smoothing: f32) -> anyhow::Result<()> {
    anyhow::ensure!(
        smoothing > 0.0 && smoothing <= 1.0,
        "smoothing factor must be in (0, 1], got {smoothing}"
    );

    let config = SmoothingConfig { factor: smoothing, ..SmoothingConfig::default() };
    let signals = SignalAggregator::new(config);

    match port {
        Some(name) => {
            info!("Connecting to {} @ {} baud", name, baud);
            let source = serial::SerialSource::open(&name, baud)?;
            stream_loop(source, signals)
        }
        None => {
            warn!("No port given, streaming simulated headset data");
            stream_loop(simulate::SimulatedSource::new(), signals)
        }
    }
}

/// Pull frames, update the aggregator, and display the smoothed signals.
///
/// Recoverable frame failures are logged and the loop keeps scanning; a
/// broken byte source ends the session.
fn stream_loop<S>(mut source: S, mut signals: SignalAggregator) -> anyhow::Result<()>
where
    S: ByteSource,
    S::Error: std::fmt::Debug,
{
    const QUALITY_INTEREST: &[(u8, &str)] = &[(codes::POOR_SIGNAL, "quality")];

    // 200 = off-head until the headset reports otherwise
    let mut noise: u8 = 200;

    loop {
        match read_frame(&mut source) {
            Ok(payload) => {
                let snapshot = signals.update(&payload);
                if let Some(DataValue::Byte(q)) =
                    decode_payload(&payload, QUALITY_INTEREST).get("quality")
                {
                    noise = *q;
                }

                print!(
                    "\rattention {:6.1} | meditation {:6.1} | alpha {:10.1} | beta {:10.1} | noise {:3}",
                    snapshot.attention, snapshot.meditation, snapshot.alpha, snapshot.beta, noise
                );
                let _ = std::io::stdout().flush();
            }
            Err(e) if e.is_fatal() => {
                return Err(anyhow::anyhow!("byte source failed: {e}"));
            }
            Err(e) => debug!("dropped frame: {}", e),
        }
    }
}

/// List available serial ports
fn list_devices() -> anyhow::Result<()> {
    info!("Available serial ports:");
    let ports = serial::SerialSource::list_ports();
    if ports.is_empty() {
        info!("  (none found)");
    }
    for port in ports {
        info!("  {}", port);
    }
    Ok(())
}
