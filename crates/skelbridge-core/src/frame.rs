//! Skeletons and frames
//!
//! A frame is one time-coherent set of skeletons and the atomic unit of
//! publication. Frames are built per packet (live) or per timestamp group
//! (recorded) and dropped as soon as they are encoded.

use crate::{Joint, Timestamp};

/// Person identifier, unique within a frame
pub type SkeletonId = i64;

/// One detected person
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub id: SkeletonId,
    /// Joints in encoding order
    pub joints: Vec<Joint>,
}

impl Skeleton {
    pub fn new(id: SkeletonId) -> Self {
        Self {
            id,
            joints: Vec::new(),
        }
    }

    /// Add a joint, dropping it if it is absent (low confidence or zero depth)
    pub fn push_joint(&mut self, joint: Joint) -> bool {
        if joint.is_valid() {
            self.joints.push(joint);
            true
        } else {
            false
        }
    }

    pub fn with_joint(mut self, joint: Joint) -> Self {
        self.push_joint(joint);
        self
    }

    /// Joints that pass the validity rule
    pub fn valid_joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter().filter(|j| j.is_valid())
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// One timestamped snapshot of zero or more skeletons
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub timestamp: Timestamp,
    pub skeletons: Vec<Skeleton>,
}

impl Frame {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            skeletons: Vec::new(),
        }
    }

    pub fn push_skeleton(&mut self, skeleton: Skeleton) {
        self.skeletons.push(skeleton);
    }

    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.push_skeleton(skeleton);
        self
    }

    pub fn skeleton_count(&self) -> usize {
        self.skeletons.len()
    }

    /// Number of valid joints across all skeletons
    pub fn joint_count(&self) -> usize {
        self.skeletons.iter().map(|s| s.valid_joints().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Landmark, Point3};

    fn joint(landmark: Landmark, z: f64, conf: f64) -> Joint {
        Joint::new(landmark, Point3::new(0.0, 0.0, z), conf)
    }

    #[test]
    fn test_push_joint_filters_absent() {
        let mut skeleton = Skeleton::new(1);
        assert!(skeleton.push_joint(joint(Landmark::Nose, 1.0, 0.9)));
        assert!(!skeleton.push_joint(joint(Landmark::LeftEye, 1.0, 0.1)));
        assert!(!skeleton.push_joint(joint(Landmark::RightEye, 0.0, 0.9)));
        assert_eq!(skeleton.joints.len(), 1);
    }

    #[test]
    fn test_valid_joints_ignores_direct_inserts() {
        let mut skeleton = Skeleton::new(1);
        skeleton.joints.push(joint(Landmark::Nose, 1.0, 0.9));
        skeleton.joints.push(joint(Landmark::LeftEye, 0.0, 0.9));
        assert_eq!(skeleton.valid_joints().count(), 1);
    }

    #[test]
    fn test_frame_counts() {
        let frame = Frame::new(Timestamp::from_millis(100))
            .with_skeleton(
                Skeleton::new(0)
                    .with_joint(joint(Landmark::Nose, 1.0, 0.9))
                    .with_joint(joint(Landmark::LeftWrist, 1.2, 0.8)),
            )
            .with_skeleton(Skeleton::new(1).with_joint(joint(Landmark::Nose, 2.0, 0.7)));

        assert_eq!(frame.skeleton_count(), 2);
        assert_eq!(frame.joint_count(), 3);
        assert!(!frame.is_empty());
        assert!(Frame::new(Timestamp::ZERO).is_empty());
    }
}
