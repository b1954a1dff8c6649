//! tapview core - packet model, event types, sink traits and configuration
//!
//! This crate provides the foundational types shared by the decode, export
//! and CLI crates:
//!
//! - **Packet**: borrowed accessors over a tshark elastic-JSON packet record
//! - **Events**: endpoint identities and the normalized request/response event
//! - **Sink**: the presentation interface events are handed to
//! - **Capture**: line-by-line reader for capture export files
//! - **Config**: TOML configuration discovery and validation

pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod packet;
pub mod sink;

// Re-export commonly used types
pub use capture::{CaptureError, CaptureLine, CaptureReader, CaptureResult};
pub use config::{ConfigError, ConfigLoader, TapviewConfig};
pub use error::{DecodeError, DecodeResult};
pub use events::{Endpoint, Event, HeaderValue, Headers, Record};
pub use packet::{Layer, LayerInstances, PacketTree, Timestamp};
pub use sink::{EventSink, Presented, SinkError, SinkResult};

/// tapview version
pub const TAPVIEW_VERSION: &str = env!("CARGO_PKG_VERSION");
