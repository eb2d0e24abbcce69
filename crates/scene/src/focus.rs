//! Focus selection: which entity is "in view" for a camera pose.
//!
//! The target point sits `target_distance` units ahead of the camera. The
//! entity nearest to it is the candidate, but an existing focus is only
//! replaced when the candidate is closer by more than `hysteresis_margin`.

use foundation::math::precision::stable_total_cmp_f64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraPose;
use crate::entity::{Entity, EntityRef};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("target distance must be finite and non-negative, got {0}")]
    TargetDistance(f64),
    #[error("hysteresis margin must be finite and non-negative, got {0}")]
    HysteresisMargin(f64),
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Distance from the camera to the target point, in scene units.
    pub target_distance: f64,
    /// Improvement required before switching away from the current focus.
    pub hysteresis_margin: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            target_distance: 30.0,
            hysteresis_margin: 1.0,
        }
    }
}

impl FocusConfig {
    pub fn new(target_distance: f64, hysteresis_margin: f64) -> Result<Self, ConfigError> {
        let cfg = Self {
            target_distance,
            hysteresis_margin,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_distance.is_finite() || self.target_distance < 0.0 {
            return Err(ConfigError::TargetDistance(self.target_distance));
        }
        if !self.hysteresis_margin.is_finite() || self.hysteresis_margin < 0.0 {
            return Err(ConfigError::HysteresisMargin(self.hysteresis_margin));
        }
        Ok(())
    }
}

/// Picks the focus for one evaluation tick.
///
/// Contract:
/// - Degenerate pose or empty `entities`: `previous` is returned unchanged.
/// - Nearest entity to the target point wins; on equal distance the first in
///   iteration order wins. Entities with non-finite positions are ignored.
/// - A set `previous` is kept unless the candidate is strictly closer than
///   `previous_distance - hysteresis_margin`.
/// - `previous` is measured at its current position in `entities` when
///   present there, otherwise at its own snapshot position (a remote focus
///   may name an id this client does not know).
pub fn select_focus(
    pose: &CameraPose,
    entities: &[Entity],
    previous: Option<&EntityRef>,
    config: &FocusConfig,
) -> Option<EntityRef> {
    let Some(target) = pose.target_point(config.target_distance) else {
        return previous.cloned();
    };
    if entities.is_empty() {
        return previous.cloned();
    }

    let mut best: Option<(f64, &Entity)> = None;
    let mut previous_live: Option<&Entity> = None;

    for entity in entities {
        if let Some(prev) = previous
            && prev.id == entity.id
        {
            previous_live = Some(entity);
        }
        if !entity.position.is_finite() {
            continue;
        }

        let d = entity.position.distance(target);
        best = match best {
            Some((bd, _)) if !stable_total_cmp_f64(d, bd).is_lt() => best,
            _ => Some((d, entity)),
        };
    }

    let Some((candidate_distance, candidate)) = best else {
        return previous.cloned();
    };
    let Some(prev) = previous else {
        return Some(candidate.to_ref());
    };

    let prev_ref = previous_live.map_or_else(|| prev.clone(), Entity::to_ref);
    if candidate.id == prev_ref.id {
        return Some(prev_ref);
    }

    let previous_distance = prev_ref.position.distance(target);
    if !previous_distance.is_finite()
        || candidate_distance < previous_distance - config.hysteresis_margin
    {
        Some(candidate.to_ref())
    } else {
        Some(prev_ref)
    }
}
