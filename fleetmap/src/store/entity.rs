//! Tracked entity types.

use std::borrow::Borrow;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::geo::LatLon;

/// Stable identifier of a tracked entity.
///
/// The wire may carry ids as JSON strings or integers; both normalise to
/// the string form so `7` and `"7"` name the same vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id. Surrounding whitespace is trimmed.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() == id.len() {
            Self(id)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        let id = match RawId::deserialize(deserializer)? {
            RawId::Text(text) => EntityId::new(text),
            RawId::Unsigned(n) => EntityId(n.to_string()),
            RawId::Signed(n) => EntityId(n.to_string()),
        };

        if id.0.is_empty() {
            return Err(de::Error::custom("entity id must not be empty"));
        }
        Ok(id)
    }
}

/// One position report as fetched from the position source.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    pub id: EntityId,
    pub position: LatLon,
}

impl PositionRecord {
    pub fn new(id: impl Into<EntityId>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            position: LatLon::new(lat, lon),
        }
    }
}

/// A vehicle shown on the map.
///
/// `selected` is local UI state: it controls callout visibility and is
/// never sourced from the network.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity {
    pub id: EntityId,
    pub position: LatLon,
    /// Display name from the bundled snapshot, if any.
    pub name: Option<String>,
    pub selected: bool,
}

impl TrackedEntity {
    /// Create an unselected entity.
    pub fn new(id: impl Into<EntityId>, position: LatLon) -> Self {
        Self {
            id: id.into(),
            position,
            name: None,
            selected: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Text shown in the callout: the name, falling back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}
