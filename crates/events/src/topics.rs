//! Event payloads for the engine's cross-cutting topics.
//!
//! Each topic gets its own [`crate::EventChannel`]: component add/remove,
//! physics contacts, screen resizes and UI root registration.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// A component was attached to or detached from an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentEvent {
    Added { entity: EntityId, component: String },
    Removed { entity: EntityId, component: String },
}

impl ComponentEvent {
    pub fn entity(&self) -> EntityId {
        match self {
            Self::Added { entity, .. } | Self::Removed { entity, .. } => *entity,
        }
    }

    pub fn component(&self) -> &str {
        match self {
            Self::Added { component, .. } | Self::Removed { component, .. } => component,
        }
    }
}

/// Two bodies started or stopped touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContactEvent {
    Begin { a: EntityId, b: EntityId },
    End { a: EntityId, b: EntityId },
}

impl ContactEvent {
    /// The contact pair with the lower id first.
    pub fn pair(&self) -> (EntityId, EntityId) {
        let (a, b) = match self {
            Self::Begin { a, b } | Self::End { a, b } => (*a, *b),
        };
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// The render surface changed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenResized {
    pub width: u32,
    pub height: u32,
}

/// A UI tree was mounted under an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiRootRegistered {
    pub entity: EntityId,
    pub name: String,
}
