//! In-memory entity store.
//!
//! Loaded once per session from the static posts flat list. The focus
//! selector only reads it; the layout pass writes positions between ticks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use foundation::EntityKey;
use foundation::math::Vec3;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::entity::Entity;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate entity id {0}")]
    DuplicateId(EntityKey),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid posts json: {0}")]
    Json(#[from] serde_json::Error),
}

/// One record of the posts flat list as produced by the layout pipeline.
#[derive(Debug, Deserialize)]
struct PostRecord {
    #[serde(alias = "postUID")]
    id: EntityKey,
    #[serde(default, alias = "ownerRef")]
    slug: String,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    #[serde(default, alias = "weight")]
    impact: Option<f64>,
}

/// Entities in insertion order with an id index.
///
/// Iteration order is stable, which the selector's tie-break relies on.
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    entities: Vec<Entity>,
    index: HashMap<EntityKey, usize>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for e in entities {
            store.insert(e)?;
        }
        Ok(store)
    }

    /// Parses a posts flat list: `[{ "id", "slug", "x", "y", "z", "impact"? }, ...]`.
    ///
    /// Records without a complete position are skipped.
    pub fn from_json_str(text: &str) -> Result<Self, StoreError> {
        let records: Vec<PostRecord> = serde_json::from_str(text)?;
        let mut store = Self::new();
        let mut skipped = 0usize;

        for rec in records {
            let (Some(x), Some(y), Some(z)) = (rec.x, rec.y, rec.z) else {
                skipped += 1;
                continue;
            };
            store.insert(Entity {
                id: rec.id,
                position: Vec3::new(x, y, z),
                owner_ref: rec.slug,
                weight: rec.impact,
            })?;
        }

        if skipped > 0 {
            warn!("skipped {skipped} posts without coordinates");
        }
        debug!("loaded {} posts", store.len());
        Ok(store)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Adds an entity. Ids are unique for the lifetime of the store.
    pub fn insert(&mut self, entity: Entity) -> Result<(), StoreError> {
        if self.index.contains_key(&entity.id) {
            return Err(StoreError::DuplicateId(entity.id));
        }
        self.index.insert(entity.id.clone(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    pub fn get(&self, id: &EntityKey) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    /// Layout write path. Returns `false` for unknown ids.
    pub fn set_position(&mut self, id: &EntityKey, position: Vec3) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.entities[i].position = position;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityStore, StoreError};
    use crate::entity::Entity;
    use foundation::EntityKey;
    use foundation::math::Vec3;

    #[test]
    fn rejects_duplicate_ids() {
        let mut store = EntityStore::new();
        store
            .insert(Entity::new(1, Vec3::ZERO, "a"))
            .expect("first insert");
        let err = store
            .insert(Entity::new(1, Vec3::new(1.0, 0.0, 0.0), "b"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(EntityKey::Int(1))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn parses_posts_flat_list() {
        let json = r#"[
            {"id": 1, "slug": "alice", "x": 1.0, "y": 2.0, "z": 3.0, "impact": 12.5},
            {"id": "p-2", "slug": "bob", "x": -1.0, "y": 0.0, "z": 0.5, "text": "ignored"},
            {"id": 3, "slug": "carol"}
        ]"#;
        let store = EntityStore::from_json_str(json).expect("parse");
        assert_eq!(store.len(), 2);

        let a = store.get(&EntityKey::Int(1)).expect("post 1");
        assert_eq!(a.owner_ref, "alice");
        assert_eq!(a.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(a.weight, Some(12.5));

        let b = store.get(&EntityKey::from("p-2")).expect("post p-2");
        assert_eq!(b.weight, None);
        assert!(store.get(&EntityKey::Int(3)).is_none());
    }

    #[test]
    fn accepts_alternate_field_names() {
        let json = r#"[
            {"postUID": "uid-9", "ownerRef": "dave", "x": 0, "y": 1, "z": 2, "weight": 3}
        ]"#;
        let store = EntityStore::from_json_str(json).expect("parse");
        let post = store.get(&EntityKey::from("uid-9")).expect("post uid-9");
        assert_eq!(post.owner_ref, "dave");
        assert_eq!(post.position, Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(post.weight, Some(3.0));
    }

    #[test]
    fn duplicate_ids_in_json_are_an_error() {
        let json = r#"[
            {"id": 1, "slug": "a", "x": 0, "y": 0, "z": 0},
            {"id": 1, "slug": "b", "x": 1, "y": 0, "z": 0}
        ]"#;
        assert!(matches!(
            EntityStore::from_json_str(json),
            Err(StoreError::DuplicateId(_))
        ));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(&path, r#"[{"id": 5, "slug": "s", "x": 0, "y": 0, "z": 1}]"#).unwrap();
        assert_eq!(EntityStore::load(&path).unwrap().len(), 1);

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            EntityStore::load(&missing),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn set_position_updates_in_place_and_keeps_order() {
        let mut store = EntityStore::from_entities([
            Entity::new(1, Vec3::ZERO, "a"),
            Entity::new(2, Vec3::ZERO, "a"),
        ])
        .unwrap();
        assert!(store.set_position(&EntityKey::Int(2), Vec3::new(4.0, 0.0, 0.0)));
        assert!(!store.set_position(&EntityKey::Int(9), Vec3::ZERO));

        let ids: Vec<_> = store.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![EntityKey::Int(1), EntityKey::Int(2)]);
        assert_eq!(store.as_slice()[1].position, Vec3::new(4.0, 0.0, 0.0));
    }
}
