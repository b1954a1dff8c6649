//! Normalized request/response events
//!
//! Every packet carrying application data becomes one or more [`Event`]s:
//! endpoint identities, flow metadata, and the protocol-agnostic
//! headers/body pair produced by a normalizer.

use crate::packet::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Network and link identity of one side of a packet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Resolved host name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Link-layer address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

impl Endpoint {
    /// Fill fields from `other`. Fields `other` leaves absent keep their
    /// current value.
    pub fn merge(&mut self, other: Endpoint) {
        if other.ip.is_some() {
            self.ip = other.ip;
        }
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.mac.is_some() {
            self.mac = other.mac;
        }
    }

    /// `"<ip> / <host>"`, only when both are known
    pub fn label(&self) -> Option<String> {
        Some(format!("{} / {}", self.ip.as_deref()?, self.host.as_deref()?))
    }
}

/// Header value
///
/// Real headers are text; the synthetic `is_request` header is a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Text(String),
    Flag(bool),
}

impl HeaderValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(text) => Some(text.as_str()),
            HeaderValue::Flag(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HeaderValue::Flag(flag) => Some(*flag),
            HeaderValue::Text(_) => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Text(text) => f.write_str(text),
            HeaderValue::Flag(flag) => write!(f, "{}", flag),
        }
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Text(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Text(value.to_string())
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Flag(value)
    }
}

/// Header mapping. A repeated name keeps its last value.
pub type Headers = BTreeMap<String, HeaderValue>;

/// Output of a protocol normalizer for one message fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub headers: Option<Headers>,
    pub data: Option<String>,
}

impl Record {
    pub fn new(headers: Option<Headers>, data: Option<String>) -> Self {
        Self { headers, data }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// True when neither headers nor body carry anything
    pub fn is_empty(&self) -> bool {
        let no_headers = self.headers.as_ref().map_or(true, |h| h.is_empty());
        let no_data = self.data.as_ref().map_or(true, |d| d.is_empty());
        no_headers && no_data
    }
}

/// A normalized application-level event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Sender identity
    pub src: Endpoint,

    /// Receiver identity
    pub dst: Endpoint,

    /// Capture timestamp of the carrying packet
    pub timestamp: Timestamp,

    /// Flow correlation identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<String>,

    /// Message headers
    pub headers: Option<Headers>,

    /// Decoded body
    pub data: Option<String>,

    /// Protocol list of the carrying frame
    pub protocol_stack: String,
}

impl Event {
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// `"<src.ip> / <src.host> -> <dst.ip> / <dst.host>"`, or `None` when any
    /// of the four identity parts is unknown
    pub fn display_line(&self) -> Option<String> {
        Some(format!("{} -> {}", self.src.label()?, self.dst.label()?))
    }
}
