//! HTTP/2 normalizer
//!
//! One packet can carry several HTTP/2 frames, so the `http2` layer is either
//! a single object or a list of objects. Each object is normalized on its
//! own and may contribute a body, headers, or both.

use crate::accessor::TopmostLayers;
use crate::body::decode_body;
use crate::normalizer::{AppProtocol, Normalizer};
use tapview_core::events::{HeaderValue, Headers, Record};
use tapview_core::packet::Layer;
use tracing::{debug, warn};

const BODY_REASSEMBLED_DATA: &str = "http2_http2_body_reassembled_data";
const DATA_DATA: &str = "http2_http2_data_data";
const HEADERS_MARKER: &str = "http2_http2_headers";
const HEADER_NAME: &str = "http2_http2_header_name";
const HEADER_VALUE: &str = "http2_http2_header_value";

/// HTTP/2 normalizer
#[derive(Debug, Default)]
pub struct Http2Normalizer;

impl Http2Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one `http2` layer object
    pub fn normalize_layer(&self, layer: Layer<'_>) -> Record {
        let data = Self::body(&layer);
        let headers = if layer.contains(HEADERS_MARKER) {
            Self::headers(&layer)
        } else {
            None
        };
        Record::new(headers, data)
    }

    /// Reassembled body if present, else the DATA frame payload
    fn body(layer: &Layer<'_>) -> Option<String> {
        layer
            .str_field(BODY_REASSEMBLED_DATA)
            .or_else(|| layer.str_field(DATA_DATA))
            .map(decode_body)
    }

    /// Pair header names with values by position. Lists of different
    /// lengths cannot be paired reliably and yield no headers.
    fn headers(layer: &Layer<'_>) -> Option<Headers> {
        let names = layer.strings(HEADER_NAME).unwrap_or_default();
        let values = layer.strings(HEADER_VALUE).unwrap_or_default();

        if names.len() != values.len() {
            warn!(
                names = names.len(),
                values = values.len(),
                "HTTP/2 header names do not match header values, dropping headers"
            );
            return None;
        }

        Some(
            names
                .into_iter()
                .zip(values)
                .map(|(name, value)| (name.to_string(), HeaderValue::from(value)))
                .collect(),
        )
    }
}

impl Normalizer for Http2Normalizer {
    fn protocol(&self) -> AppProtocol {
        AppProtocol::Http2
    }

    fn normalize(&self, layers: &TopmostLayers<'_>) -> Vec<Record> {
        match layers.instances(AppProtocol::Http2.layer_name()) {
            Some(instances) => instances
                .into_vec()
                .into_iter()
                .map(|layer| self.normalize_layer(layer))
                .collect(),
            None => {
                debug!("Stack names http2 but the packet has no http2 layer");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::topmost_layers;
    use serde_json::{json, Value};
    use std::io;
    use std::sync::{Arc, Mutex};
    use tapview_core::packet::PacketTree;
    use tracing_subscriber::FmtSubscriber;

    /// Log sink shared between the subscriber and the test
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn normalize(http2: Value) -> Vec<Record> {
        let packet: PacketTree = serde_json::from_value(json!({
            "timestamp": "1",
            "layers": { "http2": http2 }
        }))
        .unwrap();
        let top = topmost_layers(&packet, "http2", "eth:ip:tcp:tls:http2").unwrap();
        Http2Normalizer::new().normalize(&top)
    }

    fn text(value: &str) -> HeaderValue {
        HeaderValue::Text(value.to_string())
    }

    #[test]
    fn test_data_frame_body() {
        let records = normalize(json!({ "http2_http2_data_data": "68:65:6c:6c:6f" }));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data.as_deref(), Some("hello"));
        assert_eq!(records[0].headers, None);
    }

    #[test]
    fn test_reassembled_body_preferred() {
        let records = normalize(json!({
            "http2_http2_body_reassembled_data": "7b:7d",
            "http2_http2_data_data": "78"
        }));
        assert_eq!(records[0].data.as_deref(), Some("{}"));
    }

    #[test]
    fn test_binary_body_keeps_hex() {
        let records = normalize(json!({ "http2_http2_data_data": "1f:8b:08:00:ff" }));
        assert_eq!(records[0].data.as_deref(), Some("1f:8b:08:00:ff"));
    }

    #[test]
    fn test_headers_zipped() {
        let records = normalize(json!({
            "http2_http2_headers": "",
            "http2_http2_header_name": [":status", "content-type", "x-dup", "x-dup"],
            "http2_http2_header_value": ["200", "application/json", "1", "2"]
        }));
        let headers = records[0].headers.as_ref().unwrap();
        assert_eq!(headers.get(":status"), Some(&text("200")));
        assert_eq!(headers.get("content-type"), Some(&text("application/json")));
        assert_eq!(headers.get("x-dup"), Some(&text("2")));
        assert_eq!(records[0].data, None);
    }

    #[test]
    fn test_headers_ignored_without_marker() {
        let records = normalize(json!({
            "http2_http2_header_name": [":method"],
            "http2_http2_header_value": ["GET"]
        }));
        assert_eq!(records[0].headers, None);
        assert!(records[0].is_empty());
    }

    #[test]
    fn test_mismatched_headers_keep_body() {
        let records = normalize(json!({
            "http2_http2_headers": "",
            "http2_http2_header_name": ["name1", "name2"],
            "http2_http2_header_value": ["v1"],
            "http2_http2_data_data": "68:69"
        }));
        assert_eq!(records[0].headers, None);
        assert_eq!(records[0].data.as_deref(), Some("hi"));
    }

    #[test]
    fn test_mismatched_headers_are_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = FmtSubscriber::builder()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let records = tracing::subscriber::with_default(subscriber, || {
            normalize(json!({
                "http2_http2_headers": "",
                "http2_http2_header_name": ["name1", "name2"],
                "http2_http2_header_value": ["v1"]
            }))
        });

        assert_eq!(records[0].headers, None);
        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("HTTP/2 header names do not match header values"));
        assert!(output.contains("names=2"));
        assert!(output.contains("values=1"));
    }

    #[test]
    fn test_multiple_frames() {
        let records = normalize(json!([
            {
                "http2_http2_headers": "",
                "http2_http2_header_name": [":method", ":path"],
                "http2_http2_header_value": ["POST", "/api"]
            },
            { "http2_http2_data_data": "6f:6b" },
            { "http2_http2_settings": "" }
        ]));

        assert_eq!(records.len(), 3);
        let headers = records[0].headers.as_ref().unwrap();
        assert_eq!(headers.get(":path"), Some(&text("/api")));
        assert_eq!(records[1].data.as_deref(), Some("ok"));
        assert!(records[2].is_empty());
    }
}
