//! Console sink
//!
//! Renders each event that carries a body as a block: a titled rule naming
//! both endpoints, the community ID, optionally the timestamp and headers,
//! then the body itself.

use crossterm::style::{style, Color, Stylize};
use std::fmt::Write as _;
use std::io::{self, Write};
use tapview_core::config::DisplaySettings;
use tapview_core::events::Event;
use tapview_core::sink::{EventSink, Presented, SinkResult};
use tracing::debug;

/// Width used when the terminal size cannot be queried
pub const DEFAULT_WIDTH: usize = 80;

const RULE_CHAR: char = '─';
const COMMUNITY_ID_COLOR: Color = Color::Rgb {
    r: 135,
    g: 95,
    b: 135,
};

/// Console sink configuration
#[derive(Debug, Clone)]
pub struct ConsoleSinkConfig {
    /// Emit ANSI styling
    pub color: bool,

    /// Print the header mapping
    pub show_headers: bool,

    /// Print the packet timestamp
    pub show_timestamp: bool,

    /// Rule width in columns
    pub width: usize,
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_headers: true,
            show_timestamp: false,
            width: DEFAULT_WIDTH,
        }
    }
}

impl From<&DisplaySettings> for ConsoleSinkConfig {
    fn from(settings: &DisplaySettings) -> Self {
        let width = match settings.width {
            0 => terminal_width(),
            width => width as usize,
        };
        Self {
            color: settings.color,
            show_headers: settings.show_headers,
            show_timestamp: settings.show_timestamp,
            width,
        }
    }
}

/// Current terminal width in columns
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Human-readable event output
pub struct ConsoleSink<W: Write> {
    writer: W,
    config: ConsoleSinkConfig,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(config: ConsoleSinkConfig) -> Self {
        Self::new(io::stdout(), config)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W, config: ConsoleSinkConfig) -> Self {
        Self { writer, config }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn paint(&self, text: String, color: Color) -> String {
        if self.config.color {
            style(text).with(color).to_string()
        } else {
            text
        }
    }

    /// `── title ─────` padded to the configured width
    fn rule(&self, title: &str) -> String {
        let head = format!("{RULE_CHAR}{RULE_CHAR} {title} ");
        let fill = self.config.width.saturating_sub(head.chars().count()).max(3);
        let line: String = std::iter::repeat(RULE_CHAR).take(fill).collect();
        self.paint(format!("{head}{line}"), Color::Magenta)
    }

    /// Build the whole block first so a failed write never leaves half of it
    fn render(&self, event: &Event, title: &str) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{}", self.rule(title));

        let community_id = event.community_id.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "{}",
            self.paint(format!("Community ID: {community_id}"), COMMUNITY_ID_COLOR)
        );

        if self.config.show_timestamp {
            let _ = writeln!(out, "Timestamp: {}", event.timestamp);
        }

        if self.config.show_headers {
            if let Some(headers) = &event.headers {
                for (name, value) in headers {
                    let name = self.paint(name.clone(), Color::Cyan);
                    let _ = writeln!(out, "{name}: {value}");
                }
            }
        }

        if let Some(data) = &event.data {
            out.push_str(data);
            if !data.ends_with('\n') {
                out.push('\n');
            }
        }

        out.push('\n');
        out
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn present(&mut self, event: &Event) -> SinkResult<Presented> {
        if !event.has_data() {
            return Ok(Presented::Skipped);
        }

        let Some(title) = event.display_line() else {
            debug!(
                protocol_stack = %event.protocol_stack,
                "Event lacks endpoint identity, not rendered"
            );
            return Ok(Presented::Skipped);
        };

        let block = self.render(event, &title);
        self.writer.write_all(block.as_bytes())?;
        Ok(Presented::Shown)
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
