//! Camera space to bus space transform
//!
//! Camera: x = right, y = down, z = forward.
//! Bus:    x = forward, y = left, z = up.

/// 3D point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Map a camera-space point into bus space: (x, y, z) -> (z, -x, -y).
///
/// Both the live and the recorded path go through this function so that
/// replayed data lines up with real-time data. Applying it twice is not
/// the identity.
#[inline]
pub fn camera_to_bus(p: Point3) -> Point3 {
    Point3 {
        x: p.z,
        y: -p.x,
        z: -p.y,
    }
}
