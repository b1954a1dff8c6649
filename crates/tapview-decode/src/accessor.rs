//! Top-most layer access
//!
//! The frame's protocol list says which layers sit at and after the
//! application protocol. Slicing that list, rather than walking every key of
//! `layers`, keeps earlier layers (an inner `tcp` segment layer, say) out of
//! protocol decoding while still including reassembly layers that follow.

use serde_json::Value;
use std::collections::HashMap;
use tapview_core::packet::{Layer, LayerInstances, PacketTree};

/// Layers at and after one protocol in the protocol list
#[derive(Debug, Clone)]
pub struct TopmostLayers<'a> {
    names: Vec<&'a str>,
    layers: HashMap<&'a str, &'a Value>,
}

impl<'a> TopmostLayers<'a> {
    /// Layer names in protocol-list order, repeats included
    pub fn names(&self) -> &[&'a str] {
        &self.names
    }

    /// Raw layer data. Names listed in the protocol list but absent from
    /// the packet have no entry.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.layers.get(name).copied()
    }

    /// Layer `name` when it is a single object
    pub fn layer(&self, name: &str) -> Option<Layer<'a>> {
        self.get(name).and_then(Layer::from_value)
    }

    /// Layer `name` as one or more instances
    pub fn instances(&self, name: &str) -> Option<LayerInstances<'a>> {
        self.get(name).and_then(LayerInstances::from_value)
    }
}

/// Collect the layers from the first `":<protocol>"` in `stack` to the end.
///
/// Returns `None` when `protocol` does not follow any other protocol in the
/// stack.
pub fn topmost_layers<'a>(
    packet: &'a PacketTree,
    protocol: &str,
    stack: &'a str,
) -> Option<TopmostLayers<'a>> {
    let start = stack.find(&format!(":{}", protocol))? + 1;
    let names: Vec<&str> = stack[start..].split(':').collect();

    let layers = names
        .iter()
        .filter_map(|name| packet.layers.get(*name).map(|value| (*name, value)))
        .collect();

    Some(TopmostLayers { names, layers })
}
