//! Entities, their components and the contacts between them.
//!
//! The world only keeps the current state. Every change is also published on
//! the component and contact topics so systems can follow along without
//! polling.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_events::{ComponentEvent, ContactEvent, EntityId, EventChannel};
use tessera_inject::{Arguments, ContainerError, Injectable, InjectionMetadata};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),
    #[error("Entity {0} cannot be in contact with itself")]
    SelfContact(EntityId),
}

#[derive(Default)]
struct WorldState {
    entities: BTreeMap<EntityId, BTreeSet<String>>,
    contacts: BTreeSet<(EntityId, EntityId)>,
}

impl WorldState {
    fn components_mut(&mut self, entity: EntityId) -> Result<&mut BTreeSet<String>, WorldError> {
        self.entities
            .get_mut(&entity)
            .ok_or(WorldError::EntityNotFound(entity))
    }

    fn contact_pair(&self, a: EntityId, b: EntityId) -> Result<(EntityId, EntityId), WorldError> {
        if a == b {
            return Err(WorldError::SelfContact(a));
        }
        for entity in [a, b] {
            if !self.entities.contains_key(&entity) {
                return Err(WorldError::EntityNotFound(entity));
            }
        }
        Ok(if a <= b { (a, b) } else { (b, a) })
    }
}

pub struct World {
    state: Mutex<WorldState>,
    components: EventChannel<ComponentEvent>,
    contacts: EventChannel<ContactEvent>,
}

impl World {
    pub fn new(
        components: EventChannel<ComponentEvent>,
        contacts: EventChannel<ContactEvent>,
    ) -> Self {
        Self {
            state: Mutex::new(WorldState::default()),
            components,
            contacts,
        }
    }

    pub fn spawn(&self) -> EntityId {
        let entity = EntityId::new();
        self.state().entities.insert(entity, BTreeSet::new());
        debug!(entity = %entity, "Entity spawned");
        entity
    }

    /// Remove an entity, detaching its components and ending its contacts first.
    pub fn despawn(&self, entity: EntityId) -> Result<(), WorldError> {
        let (components, ended) = {
            let mut state = self.state();
            let components = state
                .entities
                .remove(&entity)
                .ok_or(WorldError::EntityNotFound(entity))?;
            let ended: Vec<_> = state
                .contacts
                .iter()
                .filter(|(a, b)| *a == entity || *b == entity)
                .copied()
                .collect();
            for pair in &ended {
                state.contacts.remove(pair);
            }
            (components, ended)
        };

        for (a, b) in ended {
            self.contacts.send(ContactEvent::End { a, b });
        }
        for component in components {
            self.components
                .send(ComponentEvent::Removed { entity, component });
        }
        debug!(entity = %entity, "Entity despawned");
        Ok(())
    }

    /// Attach a component kind. Returns false if it was already attached.
    pub fn attach(&self, entity: EntityId, component: impl Into<String>) -> Result<bool, WorldError> {
        let component = component.into();
        let added = self
            .state()
            .components_mut(entity)?
            .insert(component.clone());
        if added {
            self.components
                .send(ComponentEvent::Added { entity, component });
        }
        Ok(added)
    }

    /// Detach a component kind. Returns false if it was not attached.
    pub fn detach(&self, entity: EntityId, component: &str) -> Result<bool, WorldError> {
        let removed = self.state().components_mut(entity)?.remove(component);
        if removed {
            self.components.send(ComponentEvent::Removed {
                entity,
                component: component.to_string(),
            });
        }
        Ok(removed)
    }

    /// Record that two entities started touching.
    pub fn begin_contact(&self, a: EntityId, b: EntityId) -> Result<bool, WorldError> {
        let pair = {
            let mut state = self.state();
            let pair = state.contact_pair(a, b)?;
            state.contacts.insert(pair).then_some(pair)
        };
        Ok(match pair {
            Some((a, b)) => {
                self.contacts.send(ContactEvent::Begin { a, b });
                true
            }
            None => false,
        })
    }

    pub fn end_contact(&self, a: EntityId, b: EntityId) -> Result<bool, WorldError> {
        let pair = {
            let mut state = self.state();
            let pair = state.contact_pair(a, b)?;
            state.contacts.remove(&pair).then_some(pair)
        };
        Ok(match pair {
            Some((a, b)) => {
                self.contacts.send(ContactEvent::End { a, b });
                true
            }
            None => false,
        })
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.state().entities.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.state().entities.len()
    }

    pub fn components_of(&self, entity: EntityId) -> Option<Vec<String>> {
        self.state()
            .entities
            .get(&entity)
            .map(|components| components.iter().cloned().collect())
    }

    pub fn in_contact(&self, a: EntityId, b: EntityId) -> bool {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.state().contacts.contains(&pair)
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Injectable for World {
    fn injection() -> Option<InjectionMetadata> {
        Some(
            InjectionMetadata::new()
                .param::<EventChannel<ComponentEvent>>()
                .param::<EventChannel<ContactEvent>>(),
        )
    }

    fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
        Ok(Self::new(args.value()?, args.value()?))
    }
}
