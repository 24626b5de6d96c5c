//! Marker collection encoder
//!
//! Frame (camera space) -> MarkerArray (bus space). One sphere per valid
//! joint, ordered by skeleton, then by joint order within the skeleton.

use skelbridge_core::{camera_to_bus, Frame, Joint, Point3, Skeleton};

use crate::{
    marker_id, namespace_for, Color, Marker, MarkerAction, MarkerArray, MarkerKind, Orientation,
    DEFAULT_FRAME_ID, MARKER_SCALE,
};

/// Turns frames into marker collections
#[derive(Debug, Clone)]
pub struct MarkerEncoder {
    frame_id: String,
}

impl Default for MarkerEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_ID)
    }
}

impl MarkerEncoder {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
        }
    }

    /// Encode a frame. Absent joints never produce a marker.
    pub fn encode(&self, frame: &Frame) -> MarkerArray {
        let mut array = MarkerArray {
            markers: Vec::with_capacity(frame.joint_count()),
        };

        for skeleton in &frame.skeletons {
            self.encode_skeleton(frame, skeleton, &mut array);
        }

        array
    }

    fn encode_skeleton(&self, frame: &Frame, skeleton: &Skeleton, out: &mut MarkerArray) {
        let namespace = namespace_for(skeleton.id);
        for joint in skeleton.valid_joints() {
            out.markers.push(self.encode_joint(frame, skeleton, joint, &namespace));
        }
    }

    fn encode_joint(&self, frame: &Frame, skeleton: &Skeleton, joint: &Joint, namespace: &str) -> Marker {
        Marker {
            frame_id: self.frame_id.clone(),
            stamp: frame.timestamp.to_bus_time(),
            namespace: namespace.to_string(),
            id: marker_id(skeleton.id, &joint.key),
            kind: MarkerKind::Sphere,
            action: MarkerAction::Add,
            position: camera_to_bus(joint.position),
            orientation: Orientation::IDENTITY,
            scale: Point3::new(MARKER_SCALE, MARKER_SCALE, MARKER_SCALE),
            color: if joint.key.is_wrist() {
                Color::WRIST
            } else {
                Color::BODY
            },
        }
    }
}
