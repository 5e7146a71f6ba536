//! The record's type: a category derived from its link type.
//!
//! A [`Computed`] recomputes on every link-type change. The derived value is
//! fed through an equality-gated observable so subscribers only hear about
//! real changes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use reled_reactive::{Computed, Observable, Subscription};

use crate::catalog::TypeClassifier;
use crate::ids::LinkTypeId;

pub struct RecordType {
    value: Observable<Option<String>>,
    derived: Computed<Option<String>>,
    feed: RefCell<Option<Subscription>>,
}

impl RecordType {
    pub fn new<C>(link_type: &Observable<Option<LinkTypeId>>, classifier: Rc<C>) -> Self
    where
        C: TypeClassifier + ?Sized + 'static,
    {
        let derived = Computed::from_observable(link_type, move |id: &Option<LinkTypeId>| {
            id.and_then(|id| classifier.classify(id))
        });
        let value = Observable::new(None);
        let feed = derived.feed(link_type, &value);
        Self {
            value,
            derived,
            feed: RefCell::new(Some(feed)),
        }
    }

    /// Current category, e.g. `artist-recording`.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.value.get()
    }

    #[must_use]
    pub fn observable(&self) -> &Observable<Option<String>> {
        &self.value
    }

    /// Number of times the category was recomputed.
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.derived.version()
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&Option<String>) + 'static) -> Subscription {
        self.value.subscribe(f)
    }

    /// Stop following the link type.
    pub fn dispose(&self) {
        self.feed.borrow_mut().take();
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordType").field(&self.value.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StaticCatalog, TypeInfo};
    use std::cell::Cell;

    fn catalog() -> Rc<StaticCatalog> {
        let info = |types: &[&str]| TypeInfo {
            descr: Some("x".into()),
            entity_types: types.iter().map(|t| (*t).to_owned()).collect(),
            ..TypeInfo::default()
        };
        Rc::new(
            StaticCatalog::new()
                .with_link_type(LinkTypeId(1), info(&["artist", "recording"]))
                .with_link_type(LinkTypeId(2), info(&["artist", "recording"]))
                .with_link_type(LinkTypeId(3), info(&["artist", "work"])),
        )
    }

    #[test]
    fn emits_only_on_distinct_categories() {
        let link_type = Observable::new(Some(LinkTypeId(1)));
        let record_type = RecordType::new(&link_type, catalog());
        assert_eq!(record_type.get().as_deref(), Some("artist-recording"));

        let emitted = Rc::new(Cell::new(0));
        let emitted_clone = Rc::clone(&emitted);
        let _sub = record_type.subscribe(move |_| emitted_clone.set(emitted_clone.get() + 1));

        link_type.set(Some(LinkTypeId(2)));
        assert_eq!(emitted.get(), 0);
        assert_eq!(record_type.recomputations(), 2);

        link_type.set(Some(LinkTypeId(3)));
        assert_eq!(emitted.get(), 1);
        assert_eq!(record_type.get().as_deref(), Some("artist-work"));

        link_type.set(None);
        assert_eq!(record_type.get(), None);
        assert_eq!(emitted.get(), 2);
    }

    #[test]
    fn dispose_stops_following() {
        let link_type = Observable::new(Some(LinkTypeId(1)));
        let record_type = RecordType::new(&link_type, catalog());
        record_type.dispose();
        link_type.set(Some(LinkTypeId(3)));
        assert_eq!(record_type.get().as_deref(), Some("artist-recording"));
    }
}
