//! Presentation sinks for tapview

pub mod console;
pub mod jsonl;

pub use console::{ConsoleSink, ConsoleSinkConfig};
pub use jsonl::{JsonlSink, JsonlSinkConfig};
