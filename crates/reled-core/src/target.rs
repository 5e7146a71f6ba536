//! The relationship's target entity.

use std::fmt;
use std::rc::Rc;

use reled_reactive::{Observable, Source, Subscription};
use tracing::debug;

use crate::entity::{EntityRef, EntityResolver, TargetInput};
use crate::error::{ReledError, Result};
use crate::ids::RelationshipId;
use crate::watch::NameWatchRegistry;

/// Performs the actual target swap for a record.
///
/// Called exactly once per accepted write, after the old name watch has
/// been released. Implementations are expected to store `new` in
/// `container`; the target's validation runs when they do.
pub trait TargetChanger {
    fn change_target(&self, old: &EntityRef, new: &EntityRef, container: &Observable<EntityRef>);
}

/// Stores the new entity and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSwap;

impl TargetChanger for DirectSwap {
    fn change_target(&self, _old: &EntityRef, new: &EntityRef, container: &Observable<EntityRef>) {
        container.set(new.clone());
    }
}

struct TargetInner {
    container: Observable<EntityRef>,
    relationship: RelationshipId,
    resolver: Rc<dyn EntityResolver>,
    changer: Rc<dyn TargetChanger>,
    watchers: Rc<NameWatchRegistry>,
}

/// Reactive reference to the entity a relationship points at.
#[derive(Clone)]
pub struct Target {
    inner: Rc<TargetInner>,
}

impl Target {
    pub(crate) fn new(
        entity: EntityRef,
        relationship: RelationshipId,
        resolver: Rc<dyn EntityResolver>,
        changer: Rc<dyn TargetChanger>,
        watchers: Rc<NameWatchRegistry>,
    ) -> Self {
        Self {
            inner: Rc::new(TargetInner {
                container: Observable::new(entity),
                relationship,
                resolver,
                changer,
                watchers,
            }),
        }
    }

    #[must_use]
    pub fn get(&self) -> EntityRef {
        self.inner.container.get()
    }

    /// Point at a new entity.
    ///
    /// Raw entity data is resolved to its canonical reference first. Writing
    /// the current entity is a no-op and returns `Ok(false)`.
    ///
    /// The name watch moves in two steps: the old one is released here, and
    /// the target's validation registers the new one once the changer stores
    /// the entity.
    ///
    /// # Errors
    ///
    /// [`ReledError::UnresolvedTarget`] if the data does not resolve.
    pub fn write(&self, input: impl Into<TargetInput>) -> Result<bool> {
        let new = match input.into() {
            TargetInput::Entity(entity) => entity,
            TargetInput::Data(data) => self
                .inner
                .resolver
                .resolve(&data)
                .ok_or_else(|| ReledError::unresolved(data.gid))?,
        };
        let old = self.get();
        if old == new {
            return Ok(false);
        }

        let id = self.inner.relationship;
        self.inner.watchers.release(&old, id);
        debug!(
            message = "target.change",
            record = %id,
            from = old.gid(),
            to = new.gid()
        );
        self.inner
            .changer
            .change_target(&old, &new, &self.inner.container);
        Ok(true)
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&EntityRef) + 'static) -> Subscription {
        self.inner.container.subscribe(f)
    }

    /// The underlying container handed to the [`TargetChanger`].
    #[must_use]
    pub fn container(&self) -> &Observable<EntityRef> {
        &self.inner.container
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Target").field(&self.get()).finish()
    }
}

impl Source for Target {
    type Value = EntityRef;

    fn current(&self) -> EntityRef {
        self.get()
    }

    fn watch(&self, f: impl Fn(&EntityRef) + 'static) -> Subscription {
        self.subscribe(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityCache, EntityData};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(String, String)>>,
    }

    impl TargetChanger for Recorder {
        fn change_target(&self, old: &EntityRef, new: &EntityRef, container: &Observable<EntityRef>) {
            self.calls
                .borrow_mut()
                .push((old.gid().to_owned(), new.gid().to_owned()));
            container.set(new.clone());
        }
    }

    fn fixture() -> (Target, Rc<EntityCache>, Rc<Recorder>) {
        let cache = Rc::new(EntityCache::new());
        let first = cache.insert(EntityRef::new(Entity::new("a", "artist", "A")));
        let recorder = Rc::new(Recorder::default());
        let target = Target::new(
            first,
            RelationshipId(1),
            cache.clone(),
            recorder.clone(),
            Rc::new(NameWatchRegistry::new()),
        );
        (target, cache, recorder)
    }

    #[test]
    fn resolves_data_and_swaps_once() {
        let (target, _cache, recorder) = fixture();
        assert!(target.write(EntityData::new("b", "artist", "B")).unwrap());
        assert_eq!(target.get().gid(), "b");
        assert_eq!(*recorder.calls.borrow(), [("a".to_owned(), "b".to_owned())]);
    }

    #[test]
    fn same_entity_is_noop() {
        let (target, cache, recorder) = fixture();
        let current = cache.get("a").unwrap();
        assert!(!target.write(current).unwrap());
        assert!(!target.write(EntityData::new("a", "artist", "A")).unwrap());
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn unresolvable_data_is_an_error() {
        let (target, _cache, recorder) = fixture();
        let err = target.write(EntityData::new("", "artist", "")).unwrap_err();
        assert!(matches!(err, ReledError::UnresolvedTarget { .. }));
        assert!(recorder.calls.borrow().is_empty());
        assert_eq!(target.get().gid(), "a");
    }
}
