//! Packet dispatcher
//!
//! Picks the normalizer for a packet from its protocol list, attaches
//! endpoint identity and flow metadata to every record it produces, and
//! drops records that carry nothing.

use crate::accessor::topmost_layers;
use crate::endpoint::{extract_endpoints, IP_LAYER};
use crate::http1::Http1Normalizer;
use crate::http2::Http2Normalizer;
use crate::http3::Http3Normalizer;
use crate::normalizer::{AppProtocol, Normalizer};
use tapview_core::error::DecodeResult;
use tapview_core::events::{Endpoint, Event, Record};
use tapview_core::packet::{PacketTree, Timestamp};
use tracing::{debug, trace};

/// Per-packet fields copied into every event of that packet
struct PacketContext {
    src: Endpoint,
    dst: Endpoint,
    timestamp: Timestamp,
    community_id: Option<String>,
    protocol_stack: String,
}

impl PacketContext {
    fn event(&self, record: Record) -> Event {
        Event {
            src: self.src.clone(),
            dst: self.dst.clone(),
            timestamp: self.timestamp.clone(),
            community_id: self.community_id.clone(),
            headers: record.headers,
            data: record.data,
            protocol_stack: self.protocol_stack.clone(),
        }
    }
}

/// Routes packets to protocol normalizers
pub struct Dispatcher {
    normalizers: Vec<Box<dyn Normalizer>>,
}

impl Dispatcher {
    /// Dispatcher with the HTTP/1, HTTP/2 and HTTP/3 normalizers
    pub fn new() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(Box::new(Http3Normalizer::new()));
        dispatcher.register(Box::new(Http2Normalizer::new()));
        dispatcher.register(Box::new(Http1Normalizer::new()));
        dispatcher
    }

    /// Dispatcher without normalizers
    pub fn empty() -> Self {
        Self {
            normalizers: Vec::new(),
        }
    }

    /// Add a normalizer, replacing any registered for the same protocol
    pub fn register(&mut self, normalizer: Box<dyn Normalizer>) {
        let protocol = normalizer.protocol();
        self.normalizers.retain(|n| n.protocol() != protocol);
        self.normalizers.push(normalizer);
    }

    fn normalizer_for(&self, protocol: AppProtocol) -> Option<&dyn Normalizer> {
        self.normalizers
            .iter()
            .find(|n| n.protocol() == protocol)
            .map(|n| n.as_ref())
    }

    /// Turn one packet into events.
    ///
    /// An empty result means the packet carries nothing to show: it is not IP
    /// traffic, its application protocol is not recognized or not supported,
    /// or every record was empty. Only a packet without a protocol list is
    /// an error.
    pub fn dispatch(&self, packet: &PacketTree) -> DecodeResult<Vec<Event>> {
        let protocol_stack = packet.protocol_stack()?;

        if !packet.has_layer(IP_LAYER) {
            trace!("Skipping non-IP packet ({})", protocol_stack);
            return Ok(Vec::new());
        }

        let (src, dst) = extract_endpoints(packet, protocol_stack);

        let Some(protocol) = AppProtocol::detect(protocol_stack) else {
            trace!("No application protocol in {}", protocol_stack);
            return Ok(Vec::new());
        };

        let Some(normalizer) = self.normalizer_for(protocol) else {
            debug!("No normalizer registered for {}", protocol);
            return Ok(Vec::new());
        };

        let Some(layers) = topmost_layers(packet, protocol.layer_name(), protocol_stack) else {
            return Ok(Vec::new());
        };

        let records = normalizer.normalize(&layers);

        if !normalizer.is_supported() {
            debug!("{} decoding is not supported, dropping packet", protocol);
            return Ok(Vec::new());
        }

        let context = PacketContext {
            src,
            dst,
            timestamp: packet.timestamp.clone(),
            community_id: packet.community_id().map(str::to_string),
            protocol_stack: protocol_stack.to_string(),
        };

        let events: Vec<Event> = records
            .into_iter()
            .filter(|record| !record.is_empty())
            .map(|record| context.event(record))
            .collect();

        trace!("{} packet produced {} event(s)", protocol, events.len());
        Ok(events)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
