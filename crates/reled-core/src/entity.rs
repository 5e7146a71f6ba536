//! Entities referenced by relationships, and their resolver.
//!
//! An entity is shared by every relationship that points at it, so identity
//! matters: [`EntityRef`] compares by pointer, and resolvers must hand out the
//! same reference for the same logical entity.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use reled_reactive::Observable;
use serde::{Deserialize, Serialize};

/// An entity with a stable id and an editable name.
pub struct Entity {
    gid: String,
    entity_type: String,
    name: Observable<String>,
}

impl Entity {
    #[must_use]
    pub fn new(gid: impl Into<String>, entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            entity_type: entity_type.into(),
            name: Observable::new(name.into()),
        }
    }

    #[must_use]
    pub fn gid(&self) -> &str {
        &self.gid
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Reactive name. Writes here re-validate every relationship targeting
    /// this entity.
    #[must_use]
    pub fn name(&self) -> &Observable<String> {
        &self.name
    }
}

/// Shared, identity-compared handle to an [`Entity`].
#[derive(Clone)]
pub struct EntityRef(Rc<Entity>);

impl EntityRef {
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self(Rc::new(entity))
    }

    /// Address of the shared entity. Stable while any clone is alive.
    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EntityRef {}

impl Deref for EntityRef {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.0
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("gid", &self.gid)
            .field("type", &self.entity_type)
            .field("name", &self.name.get())
            .finish()
    }
}

/// Raw entity data as received from the rendering or network layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityData {
    pub gid: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub name: String,
}

impl EntityData {
    #[must_use]
    pub fn new(gid: impl Into<String>, entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            entity_type: entity_type.into(),
            name: name.into(),
        }
    }
}

/// A value written to a target field.
#[derive(Debug, Clone)]
pub enum TargetInput {
    Entity(EntityRef),
    Data(EntityData),
}

impl From<EntityRef> for TargetInput {
    fn from(entity: EntityRef) -> Self {
        Self::Entity(entity)
    }
}

impl From<EntityData> for TargetInput {
    fn from(data: EntityData) -> Self {
        Self::Data(data)
    }
}

/// Turns raw entity data into a canonical reference.
pub trait EntityResolver {
    /// Canonical entity for `data`, or `None` if it cannot be resolved.
    /// Repeated calls for the same logical entity return equal references.
    fn resolve(&self, data: &EntityData) -> Option<EntityRef>;
}

/// Resolver that interns entities by gid.
#[derive(Default)]
pub struct EntityCache {
    entities: RefCell<HashMap<String, EntityRef>>,
}

impl EntityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing entity; an entity already interned under the
    /// same gid wins.
    pub fn insert(&self, entity: EntityRef) -> EntityRef {
        self.entities
            .borrow_mut()
            .entry(entity.gid().to_owned())
            .or_insert(entity)
            .clone()
    }

    #[must_use]
    pub fn get(&self, gid: &str) -> Option<EntityRef> {
        self.entities.borrow().get(gid).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.borrow().is_empty()
    }
}

impl EntityResolver for EntityCache {
    fn resolve(&self, data: &EntityData) -> Option<EntityRef> {
        if data.gid.is_empty() {
            return None;
        }
        Some(self.insert(EntityRef::new(Entity::new(
            data.gid.clone(),
            data.entity_type.clone(),
            data.name.clone(),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_is_identity_stable() {
        let cache = EntityCache::new();
        let data = EntityData::new("a1", "artist", "Nina");
        let first = cache.resolve(&data).unwrap();
        let second = cache.resolve(&EntityData::new("a1", "artist", "renamed")).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.name().get(), "Nina");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_entities_are_unequal_even_with_equal_data() {
        let a = EntityRef::new(Entity::new("x", "artist", "Same"));
        let b = EntityRef::new(Entity::new("x", "artist", "Same"));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn empty_gid_does_not_resolve() {
        let cache = EntityCache::new();
        assert!(cache.resolve(&EntityData::new("", "artist", "x")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn data_deserializes_with_type_key() {
        let data: EntityData =
            serde_json::from_str(r#"{"gid": "r9", "type": "recording", "name": "Song"}"#).unwrap();
        assert_eq!(data, EntityData::new("r9", "recording", "Song"));
    }
}
