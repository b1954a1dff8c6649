//! HTTP/3 normalizer
//!
//! tshark's HTTP/3 field names are not mapped yet, so this normalizer never
//! produces headers or a body and the dispatcher drops HTTP/3 packets.

use crate::accessor::TopmostLayers;
use crate::normalizer::{AppProtocol, Normalizer};
use tapview_core::events::Record;
use tracing::trace;

/// HTTP/3 normalizer
#[derive(Debug, Default)]
pub struct Http3Normalizer;

impl Http3Normalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for Http3Normalizer {
    fn protocol(&self) -> AppProtocol {
        AppProtocol::Http3
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn normalize(&self, layers: &TopmostLayers<'_>) -> Vec<Record> {
        if let Some(instances) = layers.instances(AppProtocol::Http3.layer_name()) {
            trace!("Ignoring {} http3 layer instance(s)", instances.len());
        }
        vec![Record::empty()]
    }
}
