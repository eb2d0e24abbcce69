use serde::{Deserialize, Serialize};

use super::Vec3;

/// Rotation quaternion `(x, y, z, w)`.
///
/// Rotation helpers assume unit length.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle_rad` around `axis`. Returns `None` for a zero axis.
    pub fn from_axis_angle(axis: Vec3, angle_rad: f64) -> Option<Self> {
        let axis = axis.normalize()?;
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Some(Self::new(axis.x * s, axis.y * s, axis.z * s, c))
    }

    /// Applies the rotation to `v`.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q × v) + 2 q × (q × v)
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v).scale(2.0);
        v + t.scale(self.w) + q.cross(t)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}
