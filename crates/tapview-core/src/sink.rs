//! Presentation sink trait
//!
//! Finished events are handed to one or more sinks in input order. Sinks are
//! created once at startup by the caller and passed around explicitly.

use crate::events::Event;
use thiserror::Error;

/// Sink error type
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// What a sink did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    Shown,
    Skipped,
}

/// Destination for finished events
pub trait EventSink {
    /// Sink name
    fn name(&self) -> &str;

    /// Present one event. Events a sink cannot or will not render are
    /// reported as [`Presented::Skipped`], not as errors.
    fn present(&mut self, event: &Event) -> SinkResult<Presented>;

    /// Flush any buffered output
    fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }
}
