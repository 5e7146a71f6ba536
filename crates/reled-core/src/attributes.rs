//! The attribute set manager.
//!
//! A record's attributes are the fields legal under its current link type.
//! [`AttributeSet`] reconciles that mapping whenever the link type changes
//! or new values are written:
//!
//! - every attribute in the current schema gets a field, created on first
//!   sight or written to when a value was supplied;
//! - every field no longer in the schema has its error cleared, is disposed,
//!   and is then removed.
//!
//! Clearing the error first keeps the record's error count balanced when the
//! field disappears.
//!
//! Dependents see the mapping through a snapshot observable that is
//! re-published (unconditionally) after each reconcile and after any
//! attribute value changes.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use reled_reactive::{Observable, Source, Subscription};
use serde_json::Value;
use tracing::debug;

use crate::attribute::{AttrSnapshot, Attribute, AttributeCell};
use crate::catalog::{AttrDescriptor, LinkTypes};
use crate::field::{Field, FieldSpec, RecordLink};
use crate::ids::LinkTypeId;

struct SetInner {
    fields: RefCell<BTreeMap<String, Attribute>>,
    snapshot: Observable<AttrSnapshot>,
    link_type: Observable<Option<LinkTypeId>>,
    catalog: Rc<dyn LinkTypes>,
    link: RecordLink,
    on_link_type: RefCell<Option<Subscription>>,
}

impl SetInner {
    fn schema(&self) -> Vec<AttrDescriptor> {
        self.link_type
            .get()
            .map(|id| self.catalog.attributes_for(id))
            .unwrap_or_default()
    }

    fn create(self: &Rc<Self>, descriptor: AttrDescriptor, raw: &Value) -> Attribute {
        let name = descriptor.name.clone();
        let weak = Rc::downgrade(self);
        let cell = AttributeCell::new(descriptor, raw, move || {
            if let Some(set) = weak.upgrade() {
                set.publish();
            }
        });
        Field::attach(cell, &self.link, FieldSpec::attribute(name))
    }

    /// Bring the mapping in line with the current schema. Returns whether
    /// membership changed.
    fn reconcile(self: &Rc<Self>, values: &BTreeMap<String, Value>) -> bool {
        let mut valid = BTreeSet::new();
        let mut added = 0usize;

        for descriptor in self.schema() {
            let name = descriptor.name.clone();
            let existing = self.fields.borrow().get(&name).cloned();
            match existing {
                None => {
                    let raw = values.get(&name).unwrap_or(&Value::Null);
                    let attribute = self.create(descriptor, raw);
                    self.fields.borrow_mut().insert(name.clone(), attribute);
                    added += 1;
                }
                Some(attribute) => {
                    if let Some(raw) = values.get(&name) {
                        attribute.write(raw);
                    }
                }
            }
            valid.insert(name);
        }

        let stale: Vec<(String, Attribute)> = self
            .fields
            .borrow()
            .iter()
            .filter(|(name, _)| !valid.contains(*name))
            .map(|(name, attribute)| (name.clone(), attribute.clone()))
            .collect();
        for (name, attribute) in &stale {
            attribute.state().retire();
            self.fields.borrow_mut().remove(name);
        }

        if added > 0 || !stale.is_empty() {
            debug!(
                message = "attributes.reconcile",
                record = %self.link.id,
                added,
                removed = stale.len()
            );
        }
        added > 0 || !stale.is_empty()
    }

    fn collect(&self) -> AttrSnapshot {
        self.fields
            .borrow()
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.get()))
            .collect()
    }

    fn publish(&self) {
        self.snapshot.force_set(self.collect());
    }
}

/// Attribute fields of one record, keyed by attribute name.
///
/// Cloning creates a new handle to the same set.
#[derive(Clone)]
pub struct AttributeSet {
    inner: Rc<SetInner>,
}

impl AttributeSet {
    pub(crate) fn new(
        link_type: Observable<Option<LinkTypeId>>,
        catalog: Rc<dyn LinkTypes>,
        link: RecordLink,
        values: &BTreeMap<String, Value>,
    ) -> Self {
        let inner = Rc::new(SetInner {
            fields: RefCell::new(BTreeMap::new()),
            snapshot: Observable::new(AttrSnapshot::new()),
            link_type,
            catalog,
            link,
            on_link_type: RefCell::new(None),
        });
        inner.reconcile(values);
        inner.snapshot.set(inner.collect());
        Self { inner }
    }

    /// Re-reconcile whenever the link type changes.
    pub(crate) fn follow_link_type(&self) {
        let weak = Rc::downgrade(&self.inner);
        let subscription = self.inner.link_type.subscribe(move |_| {
            if let Some(set) = weak.upgrade() {
                set.reconcile(&BTreeMap::new());
                set.publish();
            }
        });
        *self.inner.on_link_type.borrow_mut() = Some(subscription);
    }

    /// Write `values` to the attributes legal under the current link type.
    /// Names outside the schema are ignored.
    pub fn write(&self, values: &BTreeMap<String, Value>) {
        if self.inner.reconcile(values) {
            self.inner.publish();
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Attribute> {
        self.inner.fields.borrow().get(name).cloned()
    }

    /// Attached attribute fields, in name order.
    #[must_use]
    pub fn fields(&self) -> Vec<Attribute> {
        self.inner.fields.borrow().values().cloned().collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.fields.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.fields.borrow().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.fields.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.fields.borrow().is_empty()
    }

    /// Current values by name.
    #[must_use]
    pub fn snapshot(&self) -> AttrSnapshot {
        self.inner.snapshot.get()
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&AttrSnapshot) + 'static) -> Subscription {
        self.inner.snapshot.subscribe(f)
    }

    /// Retire every attribute and stop following the link type.
    pub(crate) fn clear(&self) {
        self.inner.on_link_type.borrow_mut().take();
        let fields = std::mem::take(&mut *self.inner.fields.borrow_mut());
        for attribute in fields.values() {
            attribute.state().retire();
        }
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.fields.borrow().iter().map(|(k, v)| (k, v.get())))
            .finish()
    }
}

impl Source for AttributeSet {
    type Value = AttrSnapshot;

    fn current(&self) -> AttrSnapshot {
        self.snapshot()
    }

    fn watch(&self, f: impl Fn(&AttrSnapshot) + 'static) -> Subscription {
        self.subscribe(f)
    }
}
