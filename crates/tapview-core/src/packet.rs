//! Packet tree model
//!
//! A packet record from `tshark -T ek` carries a `timestamp` and a `layers`
//! mapping from layer name (`eth`, `ip`, `http2`, ...) to that layer's
//! fields. The dissector is loose about shapes: a field may be a string or a
//! list of strings, and a layer may be a single object or a list of objects
//! when it occurs several times in one packet. Every accessor here returns
//! `Option` so callers treat absence as "no data" rather than failing.

use crate::error::{DecodeError, DecodeResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Layer holding per-frame metadata
pub const FRAME_LAYER: &str = "frame";

/// Colon-separated protocol list inside the frame layer
pub const FRAME_PROTOCOLS_FIELD: &str = "frame_frame_protocols";

/// Layer added by `--enable-protocol communityid`
pub const COMMUNITY_ID_LAYER: &str = "communityid";

/// Flow identifier field inside the community-id layer
pub const COMMUNITY_ID_FIELD: &str = "communityid_communityid";

/// Packet timestamp as exported by tshark
///
/// EK output writes epoch milliseconds as a string, but numeric values are
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Text(String),
    Number(serde_json::Number),
}

impl Timestamp {
    /// Milliseconds since the Unix epoch, if the value is numeric
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            Timestamp::Text(text) => text.trim().parse().ok(),
            Timestamp::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.epoch_millis()?).single()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ts) = self.to_datetime() {
            return write!(f, "{}", ts.to_rfc3339());
        }
        match self {
            Timestamp::Text(text) => f.write_str(text),
            Timestamp::Number(n) => write!(f, "{}", n),
        }
    }
}

/// One decoded packet record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketTree {
    pub timestamp: Timestamp,

    #[serde(default)]
    pub layers: Map<String, Value>,
}

impl PacketTree {
    /// Parse a single packet record line
    pub fn from_json(line: &str) -> DecodeResult<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Parse a packet record from raw bytes
    pub fn from_slice(bytes: &[u8]) -> DecodeResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Layer `name` when it is a single object
    pub fn layer(&self, name: &str) -> Option<Layer<'_>> {
        self.layers.get(name).and_then(Layer::from_value)
    }

    /// Layer `name` in whichever shape the dissector produced
    pub fn layer_instances(&self, name: &str) -> Option<LayerInstances<'_>> {
        self.layers.get(name).and_then(LayerInstances::from_value)
    }

    /// Protocol list of the frame, outermost first (e.g. `eth:ip:tcp:tls:http2`)
    pub fn protocol_stack(&self) -> DecodeResult<&str> {
        let frame = self
            .layer(FRAME_LAYER)
            .ok_or_else(|| DecodeError::MissingLayer(FRAME_LAYER.to_string()))?;
        frame
            .str_field(FRAME_PROTOCOLS_FIELD)
            .ok_or_else(|| DecodeError::MissingField {
                layer: FRAME_LAYER.to_string(),
                field: FRAME_PROTOCOLS_FIELD.to_string(),
            })
    }

    /// Community ID of the flow this packet belongs to
    pub fn community_id(&self) -> Option<&str> {
        self.layer(COMMUNITY_ID_LAYER)
            .and_then(|layer| layer.str_field(COMMUNITY_ID_FIELD))
            .or_else(|| self.layers.get(COMMUNITY_ID_FIELD).and_then(Value::as_str))
    }
}

/// Borrowed view over one layer's fields
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Layer<'a> {
    pub fn new(fields: &'a Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Self::new)
    }

    /// Whether the field is present, whatever its value
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field)
    }

    /// String value of a field. For repeated fields the first occurrence is
    /// returned.
    pub fn str_field(&self, field: &str) -> Option<&'a str> {
        match self.fields.get(field)? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// All string values of a field. A single string is promoted to a
    /// one-element list; a list holding anything but strings is absent so
    /// that parallel lists never drift out of alignment.
    pub fn strings(&self, field: &str) -> Option<Vec<&'a str>> {
        match self.fields.get(field)? {
            Value::String(s) => Some(vec![s.as_str()]),
            Value::Array(items) => items.iter().map(Value::as_str).collect(),
            _ => None,
        }
    }
}

/// A layer that may occur once or several times in a packet
#[derive(Debug, Clone)]
pub enum LayerInstances<'a> {
    Single(Layer<'a>),
    Many(Vec<Layer<'a>>),
}

impl<'a> LayerInstances<'a> {
    /// Objects become `Single`, arrays become `Many` (non-object entries are
    /// dropped), anything else is absent.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::Single(Layer::new(fields))),
            Value::Array(items) => Some(Self::Many(
                items.iter().filter_map(Layer::from_value).collect(),
            )),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(layers) => layers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First instance, i.e. the outermost header when a protocol repeats
    pub fn first(&self) -> Option<Layer<'a>> {
        match self {
            Self::Single(layer) => Some(*layer),
            Self::Many(layers) => layers.first().copied(),
        }
    }

    pub fn into_vec(self) -> Vec<Layer<'a>> {
        match self {
            Self::Single(layer) => vec![layer],
            Self::Many(layers) => layers,
        }
    }
}
