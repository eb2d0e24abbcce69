use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, session-stable identifier of a spatial entity.
///
/// Upstream data uses either integers or strings, and both travel over the
/// wire unchanged. Keys of different variants never compare equal, so `1`
/// and `"1"` are distinct entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    Int(i64),
    Str(String),
}

impl From<i64> for EntityKey {
    fn from(v: i64) -> Self {
        EntityKey::Int(v)
    }
}

impl From<i32> for EntityKey {
    fn from(v: i32) -> Self {
        EntityKey::Int(i64::from(v))
    }
}

impl From<&str> for EntityKey {
    fn from(v: &str) -> Self {
        EntityKey::Str(v.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(v: String) -> Self {
        EntityKey::Str(v)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Int(v) => write!(f, "{v}"),
            EntityKey::Str(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EntityKey;

    #[test]
    fn json_keeps_integer_and_string_forms() {
        let a: EntityKey = serde_json::from_str("42").unwrap();
        let b: EntityKey = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(a, EntityKey::Int(42));
        assert_eq!(b, EntityKey::Str("42".to_string()));
        assert_ne!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "42");
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"42\"");
    }

    #[test]
    fn fractional_numbers_are_not_keys() {
        assert!(serde_json::from_str::<EntityKey>("1.5").is_err());
        assert!(serde_json::from_str::<EntityKey>("null").is_err());
    }
}
