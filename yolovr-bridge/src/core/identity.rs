//! Tracked object identities and the default body tracker table.

use super::math::Vector3;
use serde::{Deserialize, Serialize};

/// Optional role hint passed to the host at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerRole {
    LeftHand,
    RightHand,
    OptOut,
    Treadmill,
    Stylus,
}

/// Identity of one tracked object, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectIdentity {
    /// Stable id, 0..N-1. Matches the id carried on the wire.
    pub id: u32,
    pub name: String,
    /// Offset from the reference object, in the reference's local frame (meters).
    #[serde(default)]
    pub offset: Vector3,
    #[serde(default)]
    pub role: Option<TrackerRole>,
}

impl ObjectIdentity {
    pub fn new(id: u32, name: impl Into<String>, offset: Vector3) -> Self {
        Self {
            id,
            name: name.into(),
            offset,
            role: None,
        }
    }

    /// Serial number used when registering with the host.
    pub fn serial_number(&self) -> String {
        format!("YoloVr_{}_{}", self.name, self.id)
    }

    /// Human-readable name shown by the host.
    pub fn display_name(&self) -> String {
        format!("YoloVr {} Tracker", self.name)
    }

    /// Zero offset: the fallback pose is the reference pose itself.
    pub fn mirrors_reference(&self) -> bool {
        self.offset.is_zero()
    }
}

const BODY_TRACKERS: [(&str, [f32; 3]); 12] = [
    ("LeftLeg", [-0.15, -1.2, 0.0]),
    ("RightLeg", [0.15, -1.2, 0.0]),
    ("LeftThigh", [-0.2, -0.6, 0.0]),
    ("RightThigh", [0.2, -0.6, 0.0]),
    ("Hip", [0.0, -0.3, 0.0]),
    ("Waist", [0.0, -0.1, 0.0]),
    ("Chest", [0.0, 0.2, 0.0]),
    ("LeftUpperArm", [-0.35, 0.1, 0.0]),
    ("RightUpperArm", [0.35, 0.1, 0.0]),
    ("LeftForearm", [-0.4, -0.1, -0.15]),
    ("RightForearm", [0.4, -0.1, -0.15]),
    ("Head", [0.0, 0.0, 0.0]),
];

/// Default 12-entry body tracker set, ids 0..11 in table order.
pub fn body_trackers() -> Vec<ObjectIdentity> {
    BODY_TRACKERS
        .iter()
        .enumerate()
        .map(|(id, (name, offset))| {
            ObjectIdentity::new(id as u32, *name, Vector3::from_array(*offset))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_tracker_table() {
        let trackers = body_trackers();
        assert_eq!(trackers.len(), 12);
        for (i, t) in trackers.iter().enumerate() {
            assert_eq!(t.id, i as u32);
            assert!(t.role.is_none());
        }
        assert_eq!(trackers[4].name, "Hip");
        assert_eq!(trackers[9].offset, Vector3::new(-0.4, -0.1, -0.15));
    }

    #[test]
    fn test_only_head_mirrors_reference() {
        let mirroring: Vec<_> = body_trackers()
            .into_iter()
            .filter(|t| t.mirrors_reference())
            .map(|t| t.name)
            .collect();
        assert_eq!(mirroring, vec!["Head".to_string()]);
    }

    #[test]
    fn test_names() {
        let hip = &body_trackers()[4];
        assert_eq!(hip.serial_number(), "YoloVr_Hip_4");
        assert_eq!(hip.display_name(), "YoloVr Hip Tracker");
    }

    #[test]
    fn test_role_deserializes_snake_case() {
        let id: ObjectIdentity =
            toml::from_str("id = 0\nname = \"Stick\"\nrole = \"left_hand\"").unwrap();
        assert_eq!(id.role, Some(TrackerRole::LeftHand));
        assert!(id.offset.is_zero());
    }
}
