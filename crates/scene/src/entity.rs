use foundation::EntityKey;
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// A spatial point of interest ("post").
///
/// `id` never changes once assigned; `position` is rewritten by the layout
/// pass between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityKey,
    pub position: Vec3,
    /// Key of the owning character. Grouping only, never lifecycle.
    pub owner_ref: String,
    /// Presentation-only "impact" score.
    pub weight: Option<f64>,
}

impl Entity {
    pub fn new(id: impl Into<EntityKey>, position: Vec3, owner_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            owner_ref: owner_ref.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Snapshot of the fields that travel with a focus value.
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id.clone(),
            position: self.position,
            weight: self.weight,
        }
    }
}

/// Minimal, transmissible snapshot of an [`Entity`].
///
/// Two refs denote the same focus when their ids match; position and weight
/// are transient copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityKey,
    pub position: Vec3,
    pub weight: Option<f64>,
}

impl EntityRef {
    pub fn new(id: impl Into<EntityKey>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            weight: None,
        }
    }

    pub fn same_focus(&self, other: &EntityRef) -> bool {
        self.id == other.id
    }
}
