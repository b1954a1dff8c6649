//! tapview - view decrypted HTTP traffic from tshark JSON exports
//!
//! The binary is a thin shell around [`run_view`]: it reads a `tshark -T ek`
//! export, turns each packet record into events with a [`Dispatcher`], and
//! hands every event to each sink in input order.

use anyhow::Context;
use std::fmt;
use std::path::Path;
use tapview_core::capture::{validate_input_path, CaptureReader};
use tapview_core::config::TapviewConfig;
use tapview_core::sink::{EventSink, Presented};
use tapview_decode::Dispatcher;
use tapview_export::console::{ConsoleSink, ConsoleSinkConfig};
use tapview_export::jsonl::{JsonlSink, JsonlSinkConfig};
use tracing::{debug, info, warn, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self as tracing_fmt, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, Registry};

/// Handle for changing the log level after the subscriber is installed
pub type LevelHandle = reload::Handle<LevelFilter, Registry>;

/// Build the log subscriber with a level that can be changed later.
///
/// It is installed before the configuration is loaded so that config
/// discovery warnings are not lost; the configured level is applied through
/// the returned handle afterwards.
pub fn log_subscriber<W>(
    level: LevelFilter,
    writer: W,
) -> (impl Subscriber + Send + Sync, LevelHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(level);
    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );
    (subscriber, handle)
}

/// Console sink plus, when enabled, the JSONL sink
pub fn build_sinks(config: &TapviewConfig) -> anyhow::Result<Vec<Box<dyn EventSink>>> {
    let mut sinks: Vec<Box<dyn EventSink>> = Vec::new();

    sinks.push(Box::new(ConsoleSink::stdout(ConsoleSinkConfig::from(
        &config.display,
    ))));

    if config.export.jsonl.enabled {
        let jsonl = JsonlSink::create(JsonlSinkConfig::from(&config.export.jsonl))
            .with_context(|| format!("Failed to open {}", config.export.jsonl.path))?;
        sinks.push(Box::new(jsonl));
    }

    Ok(sinks)
}

/// Check the input name, create the configured sinks and process `input`.
///
/// No sink is created, and no output file touched, for an input that is
/// not a `.json` file.
pub fn view_capture(input: &Path, config: &TapviewConfig) -> anyhow::Result<RunStats> {
    validate_input_path(input)?;
    let mut sinks = build_sinks(config)?;
    run_view(input, &Dispatcher::new(), &mut sinks)
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Lines consumed, packet records or not
    pub lines_read: u64,

    /// Lines recognized as packet records
    pub packet_records: u64,

    /// Packet records that could not be parsed or lacked a protocol list
    pub parse_failures: u64,

    /// Packets that produced at least one event
    pub packets_with_events: u64,

    /// Events produced
    pub events: u64,

    /// Events at least one sink showed
    pub rendered: u64,

    /// Events every sink skipped
    pub skipped: u64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} packet records ({} failed), {} packets with events, {} events ({} rendered, {} skipped)",
            self.lines_read,
            self.packet_records,
            self.parse_failures,
            self.packets_with_events,
            self.events,
            self.rendered,
            self.skipped
        )
    }
}

/// Process the capture export at `input` and present its events.
///
/// Fails before reading anything when `input` does not name a `.json` file.
/// Lines that cannot be parsed are logged and counted; I/O and sink errors
/// end the run.
pub fn run_view(
    input: &Path,
    dispatcher: &Dispatcher,
    sinks: &mut [Box<dyn EventSink>],
) -> anyhow::Result<RunStats> {
    let mut reader = CaptureReader::open(input)?;
    let mut stats = RunStats::default();

    for line in reader.by_ref() {
        let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
        stats.packet_records += 1;

        let packet = match line.parse() {
            Ok(packet) => packet,
            Err(e) => {
                warn!(line = line.number, "Skipping unparseable packet record: {}", e);
                stats.parse_failures += 1;
                continue;
            }
        };

        let events = match dispatcher.dispatch(&packet) {
            Ok(events) => events,
            Err(e) => {
                warn!(line = line.number, "Skipping packet record: {}", e);
                stats.parse_failures += 1;
                continue;
            }
        };

        if events.is_empty() {
            debug!(line = line.number, "Packet produced no events");
            continue;
        }
        stats.packets_with_events += 1;

        for event in &events {
            stats.events += 1;
            let mut shown = false;
            for sink in sinks.iter_mut() {
                let presented = sink
                    .present(event)
                    .with_context(|| format!("Sink {} failed", sink.name()))?;
                shown |= presented == Presented::Shown;
            }
            if shown {
                stats.rendered += 1;
            } else {
                stats.skipped += 1;
            }
        }
    }

    stats.lines_read = reader.lines_read();

    for sink in sinks.iter_mut() {
        sink.flush()
            .with_context(|| format!("Failed to flush sink {}", sink.name()))?;
    }

    info!("Run complete: {}", stats);
    Ok(stats)
}
