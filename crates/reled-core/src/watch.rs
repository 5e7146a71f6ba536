//! Name watchers on shared target entities.
//!
//! A target entity may be referenced by many relationships. Each one watches
//! the entity's name so that renaming re-validates its `target` field. The
//! registry holds at most one watch per (entity, relationship) pair: a second
//! `watch` for the same pair replaces the first. Entities are keyed by
//! identity, not gid, so two distinct entities sharing a gid never displace
//! each other's watches.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use reled_reactive::Subscription;
use tracing::debug;

use crate::entity::EntityRef;
use crate::ids::RelationshipId;

type WatchKey = (usize, RelationshipId);

/// A live watch. Holding the entity keeps its identity from being reused
/// while the key is in the map.
struct NameWatch {
    _entity: EntityRef,
    _subscription: Subscription,
}

/// Keyed name subscriptions, one per (entity, relationship id).
#[derive(Default)]
pub struct NameWatchRegistry {
    watches: RefCell<HashMap<WatchKey, NameWatch>>,
}

impl NameWatchRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `entity`'s name on behalf of relationship `id`.
    pub fn watch(&self, entity: &EntityRef, id: RelationshipId, f: impl Fn(&String) + 'static) {
        let watch = NameWatch {
            _entity: entity.clone(),
            _subscription: entity.name().subscribe(f),
        };
        let previous = self
            .watches
            .borrow_mut()
            .insert((entity.identity(), id), watch);
        drop(previous);
    }

    /// Stop watching `entity` for relationship `id`. Returns whether a watch
    /// existed.
    pub fn release(&self, entity: &EntityRef, id: RelationshipId) -> bool {
        let removed = self.watches.borrow_mut().remove(&(entity.identity(), id));
        removed.is_some()
    }

    /// Move relationship `id`'s watch from `old` to `new`.
    ///
    /// Record writes do not go through here: [`Target::write`] releases the
    /// old watch and the target's validation registers the new one. This is
    /// for collaborators that move a watch without writing the target.
    ///
    /// [`Target::write`]: crate::target::Target::write
    pub fn rebind(
        &self,
        old: &EntityRef,
        new: &EntityRef,
        id: RelationshipId,
        f: impl Fn(&String) + 'static,
    ) {
        let released = self.release(old, id);
        debug!(
            message = "target.rebind",
            record = %id,
            from = old.gid(),
            to = new.gid(),
            released
        );
        self.watch(new, id, f);
    }

    /// Drop every watch held for relationship `id`. Returns how many.
    pub fn release_all(&self, id: RelationshipId) -> usize {
        let removed: Vec<NameWatch> = {
            let mut watches = self.watches.borrow_mut();
            let keys: Vec<WatchKey> = watches.keys().filter(|(_, rel)| *rel == id).copied().collect();
            keys.iter().filter_map(|key| watches.remove(key)).collect()
        };
        removed.len()
    }

    #[must_use]
    pub fn is_watching(&self, entity: &EntityRef, id: RelationshipId) -> bool {
        self.watches.borrow().contains_key(&(entity.identity(), id))
    }

    /// Watches held for relationship `id`.
    #[must_use]
    pub fn count_for(&self, id: RelationshipId) -> usize {
        self.watches.borrow().keys().filter(|(_, rel)| *rel == id).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watches.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watches.borrow().is_empty()
    }
}

impl fmt::Debug for NameWatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameWatchRegistry")
            .field("watches", &self.len())
            .finish()
    }
}
