//! tapview - view decrypted HTTP traffic from tshark JSON exports
//!
//! Produce the input with:
//! `tshark -2 -T ek --enable-protocol communityid -Ndmn -r capture.pcapng > capture.json`

use clap::Parser;
use std::path::PathBuf;
use tapview::{log_subscriber, view_capture};
use tapview_core::config::{ConfigLoader, TapviewConfig};
use tapview_core::TAPVIEW_VERSION;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "tapview")]
#[command(version)]
#[command(about = "View decrypted HTTP traffic from tshark JSON exports", long_about = None)]
struct Cli {
    /// tshark EK export (JSON lines) to read
    #[arg(short, long)]
    input: PathBuf,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short, long, env = "TAPVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Also write events as JSONL to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable styled output
    #[arg(long)]
    no_color: bool,

    /// Do not print headers
    #[arg(long)]
    no_headers: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // CLI verbose flag takes precedence, then config, then default
    let cli_level = match cli.verbose {
        0 => None,
        1 => Some(LevelFilter::INFO),
        2 => Some(LevelFilter::DEBUG),
        _ => Some(LevelFilter::TRACE),
    };

    let (subscriber, level_handle) =
        log_subscriber(cli_level.unwrap_or(LevelFilter::WARN), std::io::stderr);
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(cli.config.clone());
    if cli_level.is_none() {
        let level = LevelFilter::from_level(config.general.level());
        level_handle.modify(|filter| *filter = level)?;
    }

    apply_cli_overrides(&mut config, &cli);

    let stats = view_capture(&cli.input, &config)?;
    info!(
        lines_read = stats.lines_read,
        events = stats.events,
        rendered = stats.rendered,
        "tapview {} finished {}",
        TAPVIEW_VERSION,
        cli.input.display()
    );

    Ok(())
}

/// Load configuration from file/env, with fallback to defaults
fn load_config(cli_path: Option<PathBuf>) -> TapviewConfig {
    let loader = ConfigLoader::new().with_cli_path(cli_path);
    match loader.load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}, using defaults", e);
            TapviewConfig::default()
        }
    }
}

/// CLI flags override config file settings
fn apply_cli_overrides(config: &mut TapviewConfig, cli: &Cli) {
    if cli.no_color {
        config.display.color = false;
    }
    if cli.no_headers {
        config.display.show_headers = false;
    }
    if let Some(output) = &cli.output {
        config.export.jsonl.enabled = true;
        config.export.jsonl.path = output.display().to_string();
    }
}
