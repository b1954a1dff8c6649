//! Body decoding

use tracing::trace;

/// Decode a hex-encoded body into text.
///
/// Accepts both plain (`68656c6c6f`) and colon-delimited (`68:65:6c:6c:6f`)
/// hex. When the input is not hex or the bytes are not UTF-8, the input is
/// returned unchanged.
pub fn decode_body(encoded: &str) -> String {
    let compact: String = encoded.chars().filter(|c| *c != ':').collect();

    let bytes = match hex::decode(&compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            trace!("Body is not hex ({}), keeping it as is", e);
            return encoded.to_string();
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            trace!("Body is not UTF-8 ({}), keeping hex", e);
            encoded.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_colon_hex() {
        assert_eq!(decode_body("68:65:6c:6c:6f"), "hello");
    }

    #[test]
    fn test_decode_plain_hex() {
        assert_eq!(decode_body("6f6b"), "ok");
        assert_eq!(decode_body("7b22a"), "7b22a");
    }

    #[test]
    fn test_non_utf8_falls_back_to_hex() {
        assert_eq!(decode_body("ff:fe:00"), "ff:fe:00");
    }

    #[test]
    fn test_plain_text_is_kept() {
        assert_eq!(decode_body("hello world"), "hello world");
        assert_eq!(decode_body("{\"ok\":true}"), "{\"ok\":true}");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decode_body(""), "");
    }
}
