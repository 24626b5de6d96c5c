//! Marker types
//!
//! Shapes follow the visualization bus's marker message: one sphere per
//! valid joint, grouped per frame into a marker collection.

use skelbridge_core::{BusTime, Point3, SkeletonId};

/// Topic carrying skeleton marker collections
pub const DEFAULT_TOPIC: &str = "/human_skeleton";

/// Message type name declared for the topic
pub const MARKER_ARRAY_TYPE: &str = "visualization_msgs/msg/MarkerArray";

/// Reference frame markers are expressed in
pub const DEFAULT_FRAME_ID: &str = "camera_link";

/// Sphere diameter on every axis
pub const MARKER_SCALE: f64 = 0.05;

/// Marker identifier, unique within a namespace
pub type MarkerId = i64;

/// Namespace for a skeleton's markers
pub fn namespace_for(skeleton_id: SkeletonId) -> String {
    format!("person_{}", skeleton_id)
}

/// RGBA colour, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Wrist joints
    pub const WRIST: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    /// Every other joint
    pub const BODY: Color = Color::rgba(0.0, 1.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Marker primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarkerKind {
    Sphere = 2,
}

impl MarkerKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            2 => Some(MarkerKind::Sphere),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarkerAction {
    /// Add, or update if the (namespace, id) pair already exists
    Add = 0,
}

impl MarkerAction {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(MarkerAction::Add),
            _ => None,
        }
    }
}

/// Unit quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One visual primitive for one valid joint
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub frame_id: String,
    pub stamp: BusTime,
    pub namespace: String,
    pub id: MarkerId,
    pub kind: MarkerKind,
    pub action: MarkerAction,
    /// Bus-space position
    pub position: Point3,
    pub orientation: Orientation,
    pub scale: Point3,
    pub color: Color,
}

/// All markers of one frame, published atomically
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerArray {
    pub markers: Vec<Marker>,
}

impl MarkerArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }
}
