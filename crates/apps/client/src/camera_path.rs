//! Scripted camera used in place of interactive flight controls.

use std::f64::consts::TAU;

use foundation::math::{Quat, Vec3};
use scene::{CameraPose, EntityStore};

/// Circles the centroid of the scene on the XZ plane, always looking at it.
#[derive(Debug, Clone)]
pub struct OrbitPath {
    center: Vec3,
    radius: f64,
    period_frames: u64,
}

impl OrbitPath {
    pub fn new(center: Vec3, radius: f64, period_frames: u64) -> Self {
        Self {
            center,
            radius,
            period_frames: period_frames.max(1),
        }
    }

    /// Orbit around the centroid of every finitely placed entity.
    pub fn around(entities: &EntityStore, radius: f64, period_frames: u64) -> Self {
        let mut sum = Vec3::ZERO;
        let mut n = 0usize;
        for e in entities.iter().filter(|e| e.position.is_finite()) {
            sum = sum + e.position;
            n += 1;
        }
        let center = if n == 0 { Vec3::ZERO } else { sum.scale(1.0 / n as f64) };
        Self::new(center, radius, period_frames)
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn pose(&self, frame: u64) -> CameraPose {
        let angle = TAU * (frame % self.period_frames) as f64 / self.period_frames as f64;
        let offset = Vec3::new(angle.sin(), 0.0, angle.cos()).scale(self.radius);
        // Yaw about +Y turns the default -Z view direction back towards the center.
        let orientation =
            Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), angle).unwrap_or(Quat::IDENTITY);
        CameraPose::from_orientation(self.center + offset, orientation)
    }
}
