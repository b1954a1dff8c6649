//! Protocol dispatch and layer normalization for tapview
//!
//! This crate turns one parsed packet record into normalized events:
//!
//! - **Accessor**: isolates the layers at and after the application protocol
//! - **Endpoint**: source/destination identity from the ip, eth and sll layers
//! - **Normalizers**: per-protocol conversion of layer fields into headers/body
//! - **Dispatcher**: picks the normalizer and assembles events

pub mod accessor;
pub mod body;
pub mod dispatcher;
pub mod endpoint;
pub mod http1;
pub mod http2;
pub mod http3;
pub mod normalizer;

pub use accessor::{topmost_layers, TopmostLayers};
pub use body::decode_body;
pub use dispatcher::Dispatcher;
pub use endpoint::extract_endpoints;
pub use http1::Http1Normalizer;
pub use http2::Http2Normalizer;
pub use http3::Http3Normalizer;
pub use normalizer::{AppProtocol, Normalizer};
