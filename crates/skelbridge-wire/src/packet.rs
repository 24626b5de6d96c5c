//! Packet decoding and encoding

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use skelbridge_core::{
    BridgeError, BridgeResult, Frame, Joint, JointKey, Landmark, Point3, Skeleton, SkeletonId,
    Timestamp, LANDMARK_COUNT,
};

/// Largest datagram the producer may send
pub const MAX_PACKET_SIZE: usize = 65_535;

/// Confidence assumed when a joint carries no `conf` field
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// One joint on the wire (camera space)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireJoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default = "default_confidence")]
    pub conf: f64,
}

/// One skeleton on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSkeleton {
    pub id: SkeletonId,
    /// Free-form joint names
    pub joints: BTreeMap<String, WireJoint>,
}

/// One datagram
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WirePacket {
    #[serde(default)]
    pub skeletons: Vec<WireSkeleton>,
}

impl WirePacket {
    /// Decode a datagram. Invalid UTF-8, invalid JSON and missing required
    /// fields are all decode errors.
    pub fn decode(data: &[u8]) -> BridgeResult<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| BridgeError::InvalidPacket(format!("not UTF-8: {}", e)))?;

        serde_json::from_str(text).map_err(|e| {
            if e.is_data() {
                BridgeError::Schema(e.to_string())
            } else {
                BridgeError::InvalidPacket(e.to_string())
            }
        })
    }

    /// Encode as a single JSON document
    pub fn encode(&self) -> BridgeResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| BridgeError::InvalidPacket(e.to_string()))
    }

    /// Build a frame stamped with `timestamp`. Absent joints are dropped and
    /// joint names are kept as free-form keys.
    ///
    /// Joints follow vocabulary order, long and short names alike; names
    /// outside the vocabulary come last, by name.
    pub fn into_frame(self, timestamp: Timestamp) -> Frame {
        let mut frame = Frame::new(timestamp);
        for wire in self.skeletons {
            let mut skeleton = Skeleton::new(wire.id);
            let mut joints: Vec<(String, WireJoint)> = wire.joints.into_iter().collect();
            // Stable sort keeps name order among unknown names
            joints.sort_by_key(|(name, _)| vocabulary_rank(name));
            for (name, joint) in joints {
                skeleton.push_joint(Joint::new(
                    JointKey::Named(name),
                    Point3::new(joint.x, joint.y, joint.z),
                    joint.conf,
                ));
            }
            frame.push_skeleton(skeleton);
        }
        frame
    }

    /// Producer side: build a packet from a frame's valid joints.
    pub fn from_frame(frame: &Frame, names: JointNaming) -> Self {
        let skeletons = frame
            .skeletons
            .iter()
            .map(|skeleton| WireSkeleton {
                id: skeleton.id,
                joints: skeleton
                    .valid_joints()
                    .filter_map(|joint| {
                        let name = names.wire_name(&joint.key)?;
                        Some((
                            name,
                            WireJoint {
                                x: joint.position.x,
                                y: joint.position.y,
                                z: joint.position.z,
                                conf: joint.confidence,
                            },
                        ))
                    })
                    .collect(),
            })
            .collect();

        WirePacket { skeletons }
    }
}

fn vocabulary_rank(name: &str) -> usize {
    Landmark::from_name(name).map_or(LANDMARK_COUNT, Landmark::index)
}

/// Joint naming used when producing packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JointNaming {
    /// Every joint under its full name
    #[default]
    Full,
    /// Only the key joints (nose, shoulders, elbows, wrists) under their
    /// short names
    KeyJoints,
}

impl JointNaming {
    fn wire_name(self, key: &JointKey) -> Option<String> {
        match self {
            JointNaming::Full => Some(key.name().to_string()),
            JointNaming::KeyJoints => {
                let landmark = match key {
                    JointKey::Landmark(l) => *l,
                    JointKey::Named(name) => Landmark::from_name(name)?,
                };
                landmark.short_name().map(str::to_string)
            }
        }
    }
}
