//! Packet shape probing for wire diagnostics
//!
//! Looser than [`WirePacket::decode`]: any JSON document is accepted and
//! described, so a producer can be checked against the wire contract.

use serde_json::Value;

use crate::WirePacket;

/// Characters kept from an undecodable payload
const PREVIEW_CHARS: usize = 50;

/// What a datagram looks like
#[derive(Debug, Clone, PartialEq)]
pub enum PacketShape {
    /// Payload is not UTF-8
    NotUtf8,
    /// Payload is not a JSON document
    InvalidJson { preview: String },
    /// Payload is JSON
    Json {
        /// Length of the `skeletons` array, `None` if absent or not an array
        skeletons: Option<usize>,
        /// Total joints across skeletons
        joints: usize,
        /// Whether the payload decodes as a frame packet
        conforms: bool,
    },
}

impl PacketShape {
    pub fn probe(data: &[u8]) -> Self {
        let Ok(text) = std::str::from_utf8(data) else {
            return PacketShape::NotUtf8;
        };

        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(_) => {
                return PacketShape::InvalidJson {
                    preview: text.chars().take(PREVIEW_CHARS).collect(),
                }
            }
        };

        let skeletons = value.get("skeletons").and_then(Value::as_array);
        let joints = skeletons
            .map(|list| {
                list.iter()
                    .filter_map(|s| s.get("joints").and_then(Value::as_object))
                    .map(|j| j.len())
                    .sum()
            })
            .unwrap_or(0);

        PacketShape::Json {
            skeletons: skeletons.map(Vec::len),
            joints,
            conforms: WirePacket::decode(data).is_ok(),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, PacketShape::Json { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_probe_valid_packet() {
        let data = br#"{"skeletons":[{"id":0,"joints":{"Nose":{"x":0,"y":0,"z":1}}},{"id":1,"joints":{}}]}"#;
        assert_eq!(
            PacketShape::probe(data),
            PacketShape::Json {
                skeletons: Some(2),
                joints: 1,
                conforms: true
            }
        );
    }

    #[test]
    fn test_probe_json_without_skeletons() {
        assert_eq!(
            PacketShape::probe(br#"{"hello":"world"}"#),
            PacketShape::Json {
                skeletons: None,
                joints: 0,
                conforms: true
            }
        );
        assert_eq!(
            PacketShape::probe(br#"[1,2,3]"#),
            PacketShape::Json {
                skeletons: None,
                joints: 0,
                conforms: false
            }
        );
    }

    #[test]
    fn test_probe_invalid() {
        assert_eq!(PacketShape::probe(&[0xc3, 0x28]), PacketShape::NotUtf8);

        let long = "x".repeat(200);
        match PacketShape::probe(long.as_bytes()) {
            PacketShape::InvalidJson { preview } => assert_eq!(preview.len(), PREVIEW_CHARS),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = PacketShape::probe(&data);
            let _ = WirePacket::decode(&data);
        }
    }
}
