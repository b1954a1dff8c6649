//! Normalizer trait and application protocol detection

use crate::accessor::TopmostLayers;
use std::fmt;
use tapview_core::events::Record;

/// Application protocols a packet can terminate in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppProtocol {
    Http3,
    Http2,
    Http1,
}

impl AppProtocol {
    /// Detection order. `http2` and `http3` are tested before `http` so the
    /// newer protocols win when a stack mentions several.
    pub const PRECEDENCE: [AppProtocol; 3] =
        [AppProtocol::Http3, AppProtocol::Http2, AppProtocol::Http1];

    /// Layer (and protocol-list) name of the protocol
    pub fn layer_name(self) -> &'static str {
        match self {
            AppProtocol::Http3 => "http3",
            AppProtocol::Http2 => "http2",
            AppProtocol::Http1 => "http",
        }
    }

    /// Whether `":<layer name>"` occurs in the protocol stack
    pub fn matches(self, protocol_stack: &str) -> bool {
        protocol_stack.contains(&format!(":{}", self.layer_name()))
    }

    /// First protocol in precedence order present in the stack
    pub fn detect(protocol_stack: &str) -> Option<Self> {
        Self::PRECEDENCE
            .into_iter()
            .find(|protocol| protocol.matches(protocol_stack))
    }
}

impl fmt::Display for AppProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppProtocol::Http3 => "HTTP/3",
            AppProtocol::Http2 => "HTTP/2",
            AppProtocol::Http1 => "HTTP/1",
        };
        f.write_str(name)
    }
}

/// Converts one protocol's layer fields into headers/body records
pub trait Normalizer: Send + Sync {
    /// Protocol this normalizer handles
    fn protocol(&self) -> AppProtocol;

    /// Whether records from this normalizer should become events
    fn is_supported(&self) -> bool {
        true
    }

    /// Normalize the top-most layers of one packet. May yield several
    /// records for protocols that multiplex messages in one packet.
    fn normalize(&self, layers: &TopmostLayers<'_>) -> Vec<Record>;
}
