use clap::{Args, Parser, Subcommand};
use hound::{SampleFormat, WavSpec, WavWriter};
use linkwave_core::config::{parse_carrier, CarrierName};
use linkwave_core::{
    CarrierScheme, ErrorControl, Framing, LineCoding, LinkStatus, PipelineConfig, Simulator, SimulatorError,
    TransmissionResult, PROPAGATION_DELAY_MS, SAMPLES_PER_BIT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

/// Slack on top of the propagation delay before giving up on a transmission
const COMPLETION_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead { path: PathBuf, source: std::io::Error },

    #[error("Invalid config file {path}: {source}")]
    ConfigParse { path: PathBuf, source: serde_json::Error },

    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transmission did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Transmission finished without a result")]
    NoResult,
}

#[derive(Parser)]
#[command(name = "linkwave")]
#[command(about = "Simulate text transmission over a data link and physical layer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send text through the simulated link and report what arrived
    Transmit(TransmitArgs),

    /// List every accepted scheme name
    Schemes,
}

#[derive(Args)]
struct TransmitArgs {
    /// Text to send (one byte per character)
    #[arg(value_name = "TEXT")]
    text: String,

    /// Line coding: nrz-polar, manchester, bipolar
    #[arg(short, long)]
    line_coding: Option<String>,

    /// Carrier: ask, fsk, bpsk, qpsk, 8psk, 16-qam or none
    #[arg(short, long)]
    carrier: Option<String>,

    /// Framing: character-count, byte-stuffing, bit-stuffing
    #[arg(short, long)]
    framing: Option<String>,

    /// Error control: none, parity, checksum, crc, hamming
    #[arg(short, long)]
    error_control: Option<String>,

    /// Channel noise standard deviation
    #[arg(short, long)]
    noise: Option<f32>,

    /// Seed for reproducible channel noise
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file with default settings; flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Simulated propagation delay in milliseconds
    #[arg(long, default_value_t = PROPAGATION_DELAY_MS)]
    delay_ms: u64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the four signal buffers as WAV files into this directory
    #[arg(long, value_name = "DIR")]
    wav_dir: Option<PathBuf>,
}

/// Settings accepted from `--config`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
struct ConfigFile {
    line_coding: Option<String>,
    carrier: Option<String>,
    framing: Option<String>,
    error_control: Option<String>,
    noise_sigma: Option<f32>,
    noise_seed: Option<u64>,
}

#[derive(Serialize)]
struct Report<'a> {
    sent: &'a str,
    received: &'a str,
    status: &'a str,
    integrity_failure: bool,
    config: ConfigReport,
    frame_bits: usize,
    samples: SampleCounts,
}

#[derive(Serialize)]
struct ConfigReport {
    line_coding: String,
    carrier: String,
    framing: String,
    error_control: String,
    noise_sigma: f32,
    noise_seed: Option<u64>,
}

#[derive(Serialize)]
struct SampleCounts {
    baseband_tx: usize,
    transmitted: usize,
    received: usize,
    recovered_baseband: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Transmit(args) => transmit_command(args).await,
        Commands::Schemes => {
            schemes_command();
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(args: &TransmitArgs) -> Result<PipelineConfig, CliError> {
    let file = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| CliError::ConfigParse {
                path: path.clone(),
                source,
            })?
        }
        None => ConfigFile::default(),
    };

    let mut config = PipelineConfig::default();
    if let Some(name) = args.line_coding.as_deref().or(file.line_coding.as_deref()) {
        config.line_coding = name.parse()?;
    }
    if let Some(name) = args.carrier.as_deref().or(file.carrier.as_deref()) {
        config.carrier = parse_carrier(name)?;
    }
    if let Some(name) = args.framing.as_deref().or(file.framing.as_deref()) {
        config.framing = name.parse()?;
    }
    if let Some(name) = args.error_control.as_deref().or(file.error_control.as_deref()) {
        config.error_control = name.parse()?;
    }
    if let Some(sigma) = args.noise.or(file.noise_sigma) {
        config.noise_sigma = sigma;
    }
    config.noise_seed = args.seed.or(file.noise_seed);

    config.validate()?;
    Ok(config)
}

async fn transmit_command(args: TransmitArgs) -> Result<(), CliError> {
    let config = resolve_config(&args)?;
    let delay = Duration::from_millis(args.delay_ms);

    let simulator = Simulator::with_propagation_delay(delay);
    simulator.configure(config)?;

    let (tx, rx) = oneshot::channel::<(String, LinkStatus)>();
    let tx = Mutex::new(Some(tx));
    simulator.register_callback(move |text, status| {
        if let Some(tx) = tx.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = tx.send((text.to_string(), status));
        }
    });

    tracing::info!(delay_ms = args.delay_ms, "Sending {:?} over {}", args.text, config);
    simulator.transmit(&args.text)?;

    let limit = delay + COMPLETION_MARGIN;
    let (received, status) = tokio::time::timeout(limit, rx)
        .await
        .map_err(|_| CliError::Timeout(limit))?
        .map_err(|_| CliError::NoResult)?;
    tracing::info!(status = status.as_str(), "Transmission complete");

    let result = simulator.last_result().ok_or(CliError::NoResult)?;

    if let Some(dir) = &args.wav_dir {
        write_signals(dir, &result)?;
    }

    if args.json {
        let report = Report {
            sent: &args.text,
            received: &received,
            status: status.as_str(),
            integrity_failure: status.is_integrity_failure(),
            config: ConfigReport {
                line_coding: config.line_coding.to_string(),
                carrier: CarrierName(config.carrier).to_string(),
                framing: config.framing.to_string(),
                error_control: config.error_control.to_string(),
                noise_sigma: config.noise_sigma,
                noise_seed: config.noise_seed,
            },
            frame_bits: result.frame_bits,
            samples: SampleCounts {
                baseband_tx: result.baseband_tx.len(),
                transmitted: result.transmitted.len(),
                received: result.received.len(),
                recovered_baseband: result.recovered_baseband.len(),
            },
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Config:   {}", config);
        println!("Sent:     {}", args.text);
        println!("Received: {}", received);
        println!("Status:   {}", status);
        println!(
            "Frame:    {} bits, {} samples transmitted",
            result.frame_bits,
            result.transmitted.len()
        );
    }

    Ok(())
}

/// Write each inspection buffer as 32-bit float mono audio, one bit per second
fn write_signals(dir: &Path, result: &TransmissionResult) -> Result<(), CliError> {
    std::fs::create_dir_all(dir)?;

    let buffers: [(&str, &[f32]); 4] = [
        ("baseband_tx.wav", &result.baseband_tx),
        ("transmitted.wav", &result.transmitted),
        ("received.wav", &result.received),
        ("recovered_baseband.wav", &result.recovered_baseband),
    ];

    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLES_PER_BIT as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    for (name, samples) in buffers {
        let path = dir.join(name);
        let mut writer = WavWriter::create(&path, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        tracing::info!("Wrote {} samples to {}", samples.len(), path.display());
    }

    Ok(())
}

fn schemes_command() {
    let join = |names: Vec<String>| names.join(", ");

    println!("line coding:   {}", join(LineCoding::ALL.iter().map(|s| s.to_string()).collect()));
    println!(
        "carrier:       {}",
        join(
            std::iter::once("none".to_string())
                .chain(CarrierScheme::ALL.iter().map(|s| s.to_string()))
                .collect()
        )
    );
    println!("framing:       {}", join(Framing::ALL.iter().map(|s| s.to_string()).collect()));
    println!("error control: {}", join(ErrorControl::ALL.iter().map(|s| s.to_string()).collect()));
}
