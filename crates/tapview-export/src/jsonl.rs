//! JSONL file sink

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tapview_core::config::JsonlExportConfig;
use tapview_core::events::Event;
use tapview_core::sink::{EventSink, Presented, SinkResult};
use tracing::info;

/// JSONL sink configuration
#[derive(Debug, Clone)]
pub struct JsonlSinkConfig {
    /// Output file path
    pub path: PathBuf,

    /// Whether to append to existing file
    pub append: bool,

    /// Pretty print JSON (one object spans several lines)
    pub pretty: bool,

    /// Flush after each write
    pub flush_each: bool,
}

impl Default for JsonlSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tapview-events.jsonl"),
            append: false,
            pretty: false,
            flush_each: false,
        }
    }
}

impl From<&JsonlExportConfig> for JsonlSinkConfig {
    fn from(config: &JsonlExportConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            append: config.append,
            pretty: config.pretty,
            flush_each: config.flush_each,
        }
    }
}

/// Writes every event as one JSON object per line
pub struct JsonlSink {
    config: JsonlSinkConfig,
    writer: BufWriter<File>,
    events_written: u64,
}

impl JsonlSink {
    /// Open (or create) the output file
    pub fn create(config: JsonlSinkConfig) -> SinkResult<Self> {
        let file = if config.append {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.path)?
        } else {
            File::create(&config.path)?
        };

        info!("JSONL sink writing to: {:?}", config.path);
        Ok(Self {
            config,
            writer: BufWriter::new(file),
            events_written: 0,
        })
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }
}

impl EventSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn present(&mut self, event: &Event) -> SinkResult<Presented> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(event)?
        } else {
            serde_json::to_string(event)?
        };

        writeln!(self.writer, "{}", json)?;
        if self.config.flush_each {
            self.writer.flush()?;
        }

        self.events_written += 1;
        Ok(Presented::Shown)
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapview_core::events::Endpoint;
    use tapview_core::packet::Timestamp;
    use tempfile::NamedTempFile;

    fn event(data: Option<&str>) -> Event {
        Event {
            src: Endpoint {
                ip: Some("10.0.0.2".to_string()),
                ..Default::default()
            },
            dst: Endpoint::default(),
            timestamp: Timestamp::Text("1700000000000".to_string()),
            community_id: None,
            headers: None,
            data: data.map(str::to_string),
            protocol_stack: "eth:ip:tcp:tls:http2".to_string(),
        }
    }

    #[test]
    fn test_writes_one_line_per_event() {
        let file = NamedTempFile::new().unwrap();
        let mut sink = JsonlSink::create(JsonlSinkConfig {
            path: file.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(sink.present(&event(Some("a"))).unwrap(), Presented::Shown);
        assert_eq!(sink.present(&event(None)).unwrap(), Presented::Shown);
        sink.flush().unwrap();
        assert_eq!(sink.events_written(), 2);

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, event(Some("a")));
    }

    #[test]
    fn test_config_from_export_settings() {
        let settings = JsonlExportConfig {
            enabled: true,
            path: "/tmp/out.jsonl".to_string(),
            append: true,
            pretty: false,
            flush_each: true,
        };
        let config = JsonlSinkConfig::from(&settings);
        assert_eq!(config.path, PathBuf::from("/tmp/out.jsonl"));
        assert!(config.append);
        assert!(config.flush_each);
    }

    #[test]
    fn test_append_mode_keeps_existing_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"existing\":true}}").unwrap();

        let mut sink = JsonlSink::create(JsonlSinkConfig {
            path: file.path().to_path_buf(),
            append: true,
            flush_each: true,
            ..Default::default()
        })
        .unwrap();
        sink.present(&event(Some("b"))).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("{\"existing\":true}"));
    }
}
