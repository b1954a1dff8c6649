//! HTTP/1 normalizer
//!
//! tshark exposes each header line of a request or response as one entry of
//! `http_http_request_line` / `http_http_response_line` (with the trailing
//! CRLF kept), the body as `http_http_file_data`, and the URI either as the
//! full request URI or, on responses, as the URI being answered.

use crate::accessor::TopmostLayers;
use crate::body::decode_body;
use crate::normalizer::{AppProtocol, Normalizer};
use tapview_core::events::{Headers, Record};
use tapview_core::packet::Layer;
use tracing::debug;

const FILE_DATA: &str = "http_http_file_data";
const RESPONSE_LINE: &str = "http_http_response_line";
const REQUEST_LINE: &str = "http_http_request_line";
const RESPONSE_FOR_URI: &str = "http_http_response_for_uri";
const REQUEST_FULL_URI: &str = "http_http_request_full_uri";
const REQUEST_MARKER: &str = "http_http_request";

/// Synthetic header carrying the request or answered URI
pub const URI_HEADER: &str = "uri";

/// Synthetic header telling requests from responses
pub const IS_REQUEST_HEADER: &str = "is_request";

/// HTTP/1 normalizer
#[derive(Debug, Default)]
pub struct Http1Normalizer;

impl Http1Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one `http` layer object into exactly one record
    pub fn normalize_layer(&self, layer: Layer<'_>) -> Record {
        let data = layer
            .str_field(FILE_DATA)
            .map(decode_body)
            .unwrap_or_default();

        let header_lines = if layer.contains(RESPONSE_LINE) {
            layer.strings(RESPONSE_LINE)
        } else if layer.contains(REQUEST_LINE) {
            layer.strings(REQUEST_LINE)
        } else {
            None
        };

        let mut headers = Headers::new();
        for line in header_lines.unwrap_or_default() {
            if let Some((name, value)) = split_header_line(line) {
                headers.insert(name.to_string(), value.into());
            }
        }

        let uri = if layer.contains(RESPONSE_FOR_URI) {
            layer.str_field(RESPONSE_FOR_URI)
        } else {
            layer.str_field(REQUEST_FULL_URI)
        };
        if let Some(uri) = uri {
            headers.insert(URI_HEADER.to_string(), uri.into());
        }

        headers.insert(
            IS_REQUEST_HEADER.to_string(),
            layer.contains(REQUEST_MARKER).into(),
        );

        Record::new(Some(headers), Some(data))
    }
}

/// Split a `Name: Value` line at the first `": "`. Lines without the
/// separator (request and status lines) carry no header.
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(": ")?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

impl Normalizer for Http1Normalizer {
    fn protocol(&self) -> AppProtocol {
        AppProtocol::Http1
    }

    fn normalize(&self, layers: &TopmostLayers<'_>) -> Vec<Record> {
        match layers.instances(AppProtocol::Http1.layer_name()) {
            Some(instances) => instances
                .into_vec()
                .into_iter()
                .map(|layer| self.normalize_layer(layer))
                .collect(),
            None => {
                debug!("Stack names http but the packet has no http layer");
                Vec::new()
            }
        }
    }
}
