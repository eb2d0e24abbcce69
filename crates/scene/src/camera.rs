use foundation::math::{Quat, Vec3};

/// Camera snapshot for one evaluation.
///
/// `forward` is not required to be unit length; the selector normalizes it
/// and skips the tick when that is impossible.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Builds a pose from a scene-graph orientation (camera looks down `-Z`).
    pub fn from_orientation(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            forward: orientation.rotate(Vec3::new(0.0, 0.0, -1.0)),
        }
    }

    /// Point `distance` units ahead of the camera.
    ///
    /// Returns `None` when the pose is degenerate.
    pub fn target_point(&self, distance: f64) -> Option<Vec3> {
        if !self.position.is_finite() {
            return None;
        }
        let dir = self.forward.normalize()?;
        Some(self.position + dir.scale(distance))
    }
}

#[cfg(test)]
mod tests {
    use super::CameraPose;
    use foundation::math::{Quat, Vec3};

    #[test]
    fn identity_orientation_looks_down_negative_z() {
        let pose = CameraPose::from_orientation(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        assert_eq!(pose.target_point(10.0), Some(Vec3::new(1.0, 2.0, -7.0)));
    }

    #[test]
    fn forward_length_does_not_scale_target() {
        let pose = CameraPose::new(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(pose.target_point(30.0), Some(Vec3::new(0.0, 30.0, 0.0)));
    }

    #[test]
    fn huge_forward_vector_still_has_a_target() {
        let pose = CameraPose::new(Vec3::ZERO, Vec3::new(1e200, 0.0, 0.0));
        assert_eq!(pose.target_point(30.0), Some(Vec3::new(30.0, 0.0, 0.0)));
    }

    #[test]
    fn degenerate_pose_has_no_target() {
        assert_eq!(CameraPose::new(Vec3::ZERO, Vec3::ZERO).target_point(1.0), None);
        let nan = CameraPose::new(Vec3::new(f64::NAN, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(nan.target_point(1.0), None);
        let inf = CameraPose::new(Vec3::ZERO, Vec3::new(f64::INFINITY, 0.0, 0.0));
        assert_eq!(inf.target_point(1.0), None);
    }
}
