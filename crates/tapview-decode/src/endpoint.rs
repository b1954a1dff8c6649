//! Endpoint extraction from network and link layers

use tapview_core::events::Endpoint;
use tapview_core::packet::{Layer, PacketTree};

pub const IP_LAYER: &str = "ip";
pub const ETH_LAYER: &str = "eth";
pub const SLL_LAYER: &str = "sll";

const IP_SRC: &str = "ip_ip_src";
const IP_SRC_HOST: &str = "ip_ip_src_host";
const IP_DST: &str = "ip_ip_dst";
const IP_DST_HOST: &str = "ip_ip_dst_host";
const ETH_SRC: &str = "eth_eth_src";
const ETH_DST: &str = "eth_eth_dst";
const SLL_SRC: &str = "sll_sll_src_eth";

/// Source and destination identity of a packet.
///
/// IP address and resolved host come from the `ip` layer. MAC addresses are
/// merged in from `eth` when the stack starts with `eth:`, or from `sll`
/// (source only; Linux cooked capture has no destination address) when it
/// starts with `sll:`. Fields missing from the packet stay `None`.
///
/// Tunnelled traffic repeats a layer as a list; the first (outermost)
/// instance is used.
pub fn extract_endpoints(packet: &PacketTree, protocol_stack: &str) -> (Endpoint, Endpoint) {
    let (mut src, mut dst) = outermost(packet, IP_LAYER)
        .map(ip_endpoints)
        .unwrap_or_default();

    let link = if protocol_stack.starts_with("eth:") {
        outermost(packet, ETH_LAYER).map(eth_endpoints)
    } else if protocol_stack.starts_with("sll:") {
        outermost(packet, SLL_LAYER).map(sll_endpoints)
    } else {
        None
    };

    if let Some((link_src, link_dst)) = link {
        src.merge(link_src);
        dst.merge(link_dst);
    }

    (src, dst)
}

fn outermost<'a>(packet: &'a PacketTree, name: &str) -> Option<Layer<'a>> {
    packet.layer_instances(name)?.first()
}

fn owned(layer: &Layer<'_>, field: &str) -> Option<String> {
    layer.str_field(field).map(str::to_string)
}

fn ip_endpoints(layer: Layer<'_>) -> (Endpoint, Endpoint) {
    (
        Endpoint {
            ip: owned(&layer, IP_SRC),
            host: owned(&layer, IP_SRC_HOST),
            mac: None,
        },
        Endpoint {
            ip: owned(&layer, IP_DST),
            host: owned(&layer, IP_DST_HOST),
            mac: None,
        },
    )
}

fn eth_endpoints(layer: Layer<'_>) -> (Endpoint, Endpoint) {
    (
        Endpoint {
            mac: owned(&layer, ETH_SRC),
            ..Default::default()
        },
        Endpoint {
            mac: owned(&layer, ETH_DST),
            ..Default::default()
        },
    )
}

fn sll_endpoints(layer: Layer<'_>) -> (Endpoint, Endpoint) {
    (
        Endpoint {
            mac: owned(&layer, SLL_SRC),
            ..Default::default()
        },
        Endpoint::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn packet(layers: Value) -> PacketTree {
        serde_json::from_value(json!({ "timestamp": "1", "layers": layers })).unwrap()
    }

    fn ip_layer() -> Value {
        json!({
            "ip_ip_src": "10.0.0.2",
            "ip_ip_src_host": "phone.lan",
            "ip_ip_dst": "142.250.74.110",
            "ip_ip_dst_host": "www.google.com"
        })
    }

    #[test]
    fn test_ethernet_endpoints() {
        let packet = packet(json!({
            "ip": ip_layer(),
            "eth": { "eth_eth_src": "02:00:00:00:00:01", "eth_eth_dst": "02:00:00:00:00:02" }
        }));
        let (src, dst) = extract_endpoints(&packet, "eth:ethertype:ip:tcp:http");

        assert_eq!(src.ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(src.host.as_deref(), Some("phone.lan"));
        assert_eq!(src.mac.as_deref(), Some("02:00:00:00:00:01"));
        assert_eq!(dst.ip.as_deref(), Some("142.250.74.110"));
        assert_eq!(dst.host.as_deref(), Some("www.google.com"));
        assert_eq!(dst.mac.as_deref(), Some("02:00:00:00:00:02"));
    }

    #[test]
    fn test_linux_cooked_endpoints() {
        let packet = packet(json!({
            "ip": ip_layer(),
            "sll": { "sll_sll_src_eth": "02:00:00:00:00:03" }
        }));
        let (src, dst) = extract_endpoints(&packet, "sll:ethertype:ip:tcp:tls:http2");

        assert_eq!(src.mac.as_deref(), Some("02:00:00:00:00:03"));
        assert_eq!(dst.mac, None);
        assert_eq!(dst.ip.as_deref(), Some("142.250.74.110"));
    }

    #[test]
    fn test_link_layer_ignored_for_other_stacks() {
        let packet = packet(json!({
            "ip": ip_layer(),
            "eth": { "eth_eth_src": "02:00:00:00:00:01" }
        }));
        let (src, _) = extract_endpoints(&packet, "raw:ip:tcp:http");
        assert_eq!(src.mac, None);
    }

    #[test]
    fn test_tunnelled_ip_uses_outer_header() {
        let packet = packet(json!({
            "ip": [
                ip_layer(),
                { "ip_ip_src": "192.168.100.1", "ip_ip_dst": "192.168.100.2" }
            ],
            "eth": [{ "eth_eth_src": "02:00:00:00:00:01", "eth_eth_dst": "02:00:00:00:00:02" }]
        }));
        let (src, dst) = extract_endpoints(&packet, "eth:ethertype:ip:gre:ip:tcp:http");

        assert_eq!(src.ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(src.host.as_deref(), Some("phone.lan"));
        assert_eq!(src.mac.as_deref(), Some("02:00:00:00:00:01"));
        assert_eq!(dst.host.as_deref(), Some("www.google.com"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let packet = packet(json!({
            "ip": { "ip_ip_src": "10.0.0.2" }
        }));
        let (src, dst) = extract_endpoints(&packet, "eth:ip:tcp:http");

        assert_eq!(src.ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(src.host, None);
        assert_eq!(src.mac, None);
        assert_eq!(dst, Endpoint::default());
    }
}
