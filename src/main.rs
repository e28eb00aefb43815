//! `datauri` - decode data URIs, files and text from the command line.
//!
//! Each argument naming an existing file is read from disk; anything else is
//! classified as a data URI, a remote URL (refused) or plain text. One JSON
//! summary per input is written to stdout.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use datauri::{DataUriConfig, Input, LocalFile, LogFormat, LoggingConfig, decode_input};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Decode data: URIs, files and text into typed file records", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name to use instead of the derived one (applies to every input)
    #[arg(long)]
    name: Option<String>,

    /// Data URIs, file paths or text
    #[arg(required = true)]
    inputs: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DataUriConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DataUriConfig::default(),
    };
    init_tracing(&config.logging);
    tracing::debug!(config = ?cli.config, inputs = cli.inputs.len(), "cli_start");

    let decoder = config.build_decoder()?;
    let mut failures = 0usize;

    for arg in cli.inputs {
        let input = if Path::new(&arg).is_file() {
            Input::file(LocalFile::new(&arg))
        } else {
            Input::Text(arg)
        };

        match decode_input(&decoder, input, cli.name.as_deref()) {
            Ok(record) => println!("{}", serde_json::to_string(&record)?),
            Err(err) => {
                failures += 1;
                eprintln!("error: {err}");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} input(s) failed to decode");
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_env("DATAURI_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
