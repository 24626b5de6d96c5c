//! Joint vocabulary - the 17 COCO body landmarks
//!
//! Recorded logs address joints by their position in this vocabulary.
//! Live producers address joints by free-form name, which is kept as-is
//! in [`JointKey::Named`].

use std::fmt;

use crate::Point3;

/// Joints below this confidence are absent.
pub const CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Number of landmarks in the fixed vocabulary
pub const LANDMARK_COUNT: usize = 17;

/// Body landmark in the fixed 17-entry vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Landmark {
    // Head
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,

    // Arms
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,

    // Legs
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Landmark {
    /// All landmarks in vocabulary order
    pub fn all() -> &'static [Landmark; LANDMARK_COUNT] {
        &[
            Landmark::Nose,
            Landmark::LeftEye,
            Landmark::RightEye,
            Landmark::LeftEar,
            Landmark::RightEar,
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftElbow,
            Landmark::RightElbow,
            Landmark::LeftWrist,
            Landmark::RightWrist,
            Landmark::LeftHip,
            Landmark::RightHip,
            Landmark::LeftKnee,
            Landmark::RightKnee,
            Landmark::LeftAnkle,
            Landmark::RightAnkle,
        ]
    }

    /// Position in the vocabulary (0..17)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Landmark> {
        Self::all().get(index).copied()
    }

    /// Display name, as used in recordings
    pub fn name(self) -> &'static str {
        match self {
            Landmark::Nose => "Nose",
            Landmark::LeftEye => "Left Eye",
            Landmark::RightEye => "Right Eye",
            Landmark::LeftEar => "Left Ear",
            Landmark::RightEar => "Right Ear",
            Landmark::LeftShoulder => "Left Shoulder",
            Landmark::RightShoulder => "Right Shoulder",
            Landmark::LeftElbow => "Left Elbow",
            Landmark::RightElbow => "Right Elbow",
            Landmark::LeftWrist => "Left Wrist",
            Landmark::RightWrist => "Right Wrist",
            Landmark::LeftHip => "Left Hip",
            Landmark::RightHip => "Right Hip",
            Landmark::LeftKnee => "Left Knee",
            Landmark::RightKnee => "Right Knee",
            Landmark::LeftAnkle => "Left Ankle",
            Landmark::RightAnkle => "Right Ankle",
        }
    }

    /// Short name used by the live producer for its key joints
    pub fn short_name(self) -> Option<&'static str> {
        match self {
            Landmark::Nose => Some("Nose"),
            Landmark::LeftShoulder => Some("LShoulder"),
            Landmark::RightShoulder => Some("RShoulder"),
            Landmark::LeftElbow => Some("LElbow"),
            Landmark::RightElbow => Some("RElbow"),
            Landmark::LeftWrist => Some("LWrist"),
            Landmark::RightWrist => Some("RWrist"),
            _ => None,
        }
    }

    /// Resolve a display name or short name
    pub fn from_name(name: &str) -> Option<Landmark> {
        Self::all()
            .iter()
            .copied()
            .find(|l| l.name() == name || l.short_name() == Some(name))
    }

    /// Key joints forwarded by the live producer
    pub fn key_joints() -> &'static [Landmark] {
        &[
            Landmark::Nose,
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftElbow,
            Landmark::RightElbow,
            Landmark::LeftWrist,
            Landmark::RightWrist,
        ]
    }

    pub fn is_wrist(self) -> bool {
        matches!(self, Landmark::LeftWrist | Landmark::RightWrist)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a joint is addressed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JointKey {
    /// Fixed vocabulary entry (recorded path)
    Landmark(Landmark),
    /// Free-form name as sent by a live producer
    Named(String),
}

impl JointKey {
    pub fn name(&self) -> &str {
        match self {
            JointKey::Landmark(l) => l.name(),
            JointKey::Named(name) => name,
        }
    }

    /// Wrist joints are rendered in their own colour
    pub fn is_wrist(&self) -> bool {
        match self {
            JointKey::Landmark(l) => l.is_wrist(),
            JointKey::Named(name) => name.to_ascii_lowercase().contains("wrist"),
        }
    }
}

impl From<Landmark> for JointKey {
    fn from(landmark: Landmark) -> Self {
        JointKey::Landmark(landmark)
    }
}

impl fmt::Display for JointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One body landmark observation in camera space
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub key: JointKey,
    pub position: Point3,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
}

impl Joint {
    pub fn new(key: impl Into<JointKey>, position: Point3, confidence: f64) -> Self {
        Self {
            key: key.into(),
            position,
            confidence,
        }
    }

    /// A joint under the confidence threshold or at zero depth is absent.
    pub fn is_valid(&self) -> bool {
        self.confidence >= CONFIDENCE_THRESHOLD && self.position.z != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_order() {
        let all = Landmark::all();
        assert_eq!(all.len(), LANDMARK_COUNT);
        for (i, landmark) in all.iter().enumerate() {
            assert_eq!(landmark.index(), i);
            assert_eq!(Landmark::from_index(i), Some(*landmark));
        }
        assert_eq!(Landmark::from_index(LANDMARK_COUNT), None);
        assert_eq!(Landmark::LeftWrist.index(), 9);
        assert_eq!(Landmark::RightAnkle.index(), 16);
    }

    #[test]
    fn test_from_name_long_and_short() {
        assert_eq!(Landmark::from_name("Left Wrist"), Some(Landmark::LeftWrist));
        assert_eq!(Landmark::from_name("LWrist"), Some(Landmark::LeftWrist));
        assert_eq!(Landmark::from_name("RShoulder"), Some(Landmark::RightShoulder));
        assert_eq!(Landmark::from_name("Nose"), Some(Landmark::Nose));
        assert_eq!(Landmark::from_name("Tail"), None);

        for landmark in Landmark::key_joints() {
            let short = landmark.short_name().unwrap();
            assert_eq!(Landmark::from_name(short), Some(*landmark));
        }
    }

    #[test]
    fn test_wrist_detection() {
        let wrists: Vec<_> = Landmark::all().iter().filter(|l| l.is_wrist()).collect();
        assert_eq!(wrists, vec![&Landmark::LeftWrist, &Landmark::RightWrist]);

        assert!(JointKey::Named("LWrist".into()).is_wrist());
        assert!(JointKey::Named("right wrist".into()).is_wrist());
        assert!(!JointKey::Named("LElbow".into()).is_wrist());
        assert!(JointKey::from(Landmark::RightWrist).is_wrist());
    }

    #[test]
    fn test_joint_validity() {
        let ok = Joint::new(Landmark::Nose, Point3::new(0.1, 0.2, 1.0), 0.9);
        assert!(ok.is_valid());

        let at_threshold = Joint::new(Landmark::Nose, Point3::new(0.1, 0.2, 1.0), 0.3);
        assert!(at_threshold.is_valid());

        let low = Joint::new(Landmark::Nose, Point3::new(0.1, 0.2, 1.0), 0.29);
        assert!(!low.is_valid());

        let no_depth = Joint::new(Landmark::Nose, Point3::new(0.1, 0.2, 0.0), 0.9);
        assert!(!no_depth.is_valid());
    }
}
