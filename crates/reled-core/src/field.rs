//! The field extension: error state, dirty tracking, and validation wiring
//! layered onto any reactive [`Source`].
//!
//! [`Field::attach`] is the single place where a field's local transitions
//! reach the owning record. Every error transition (empty to non-empty or
//! back) and every dirty-state transition is turned into a [`Delta`] and
//! applied to the record's [`Tally`] exactly once, synchronously, inside the
//! write that caused it.
//!
//! # Wiring
//!
//! 1. An error observable, seeded from the server-reported error for the
//!    field's full name. A seeded error counts toward the tally immediately.
//! 2. An error subscription reporting empty/non-empty transitions.
//! 3. Unless passive: a value subscription dispatching to the validation
//!    handler for the field's kind.
//! 4. Unless passive or the record is new: a value subscription comparing
//!    against the baseline and reporting dirty transitions.
//!
//! Passive fields (attribute sub-fields) skip 3 and 4; the record-level
//! `attributes` handler sets their errors instead.
//!
//! # Lifecycle
//!
//! Fields hold only weak references to their record and its tally. Disposal
//! drops every subscription and happens at most once.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use reled_reactive::{Observable, Source, Subscription};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::attribute::AttrValue;
use crate::baseline::{Baseline, BaselineStore, ServerErrors};
use crate::date::DateParts;
use crate::entity::EntityRef;
use crate::ids::{LinkTypeId, RelationshipId};
use crate::messages::Messages;
use crate::relationship::Relationship;
use crate::tally::{Action, Delta, Tally};
use crate::validate::{self, Candidate, FieldKind, Violation};

/// How a field is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldName {
    /// A record-level field with a validation handler.
    Known(FieldKind),
    /// An attribute sub-field, addressed by attribute name.
    Attribute(String),
}

impl FieldName {
    /// Name used for baseline lookups.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(kind) => kind.as_str(),
            Self::Attribute(name) => name,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Self::Known(kind) => Some(*kind),
            Self::Attribute(_) => None,
        }
    }

    /// Name used for server-reported errors.
    fn default_full_name(&self) -> String {
        match self {
            Self::Known(kind) => kind.as_str().to_owned(),
            Self::Attribute(name) => format!("attrs.{name}"),
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`Field::attach`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: FieldName,
    /// Display name; defaults from `name`.
    pub full_name: Option<String>,
    /// Skip validation and dirty tracking.
    pub passive: bool,
}

impl FieldSpec {
    #[must_use]
    pub fn known(kind: FieldKind) -> Self {
        Self {
            name: FieldName::Known(kind),
            full_name: None,
            passive: false,
        }
    }

    /// Passive attribute sub-field named `attrs.<name>`.
    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: FieldName::Attribute(name.into()),
            full_name: None,
            passive: true,
        }
    }
}

/// A value type a field can hold.
pub trait FieldValue: Clone + 'static {
    /// Borrowed view handed to validation.
    fn candidate(&self) -> Candidate<'_>;

    /// Whether the value has diverged from `original`.
    fn differs_from(&self, original: Option<&Baseline>) -> bool;
}

/// Deep comparison of the serialized value; no baseline counts as differing.
fn json_differs<T: Serialize>(value: &T, original: Option<&Baseline>) -> bool {
    match original {
        Some(Baseline::Value(original)) => {
            serde_json::to_value(value).map_or(true, |current| current != *original)
        }
        _ => true,
    }
}

impl FieldValue for Option<LinkTypeId> {
    fn candidate(&self) -> Candidate<'_> {
        Candidate::LinkType(*self)
    }

    fn differs_from(&self, original: Option<&Baseline>) -> bool {
        json_differs(self, original)
    }
}

impl FieldValue for DateParts {
    fn candidate(&self) -> Candidate<'_> {
        Candidate::Date(self)
    }

    fn differs_from(&self, original: Option<&Baseline>) -> bool {
        json_differs(self, original)
    }
}

impl FieldValue for Value {
    fn candidate(&self) -> Candidate<'_> {
        Candidate::Json(self)
    }

    fn differs_from(&self, original: Option<&Baseline>) -> bool {
        json_differs(self, original)
    }
}

impl FieldValue for AttrValue {
    fn candidate(&self) -> Candidate<'_> {
        Candidate::Attribute(self)
    }

    fn differs_from(&self, original: Option<&Baseline>) -> bool {
        json_differs(self, original)
    }
}

impl FieldValue for BTreeMap<String, AttrValue> {
    fn candidate(&self) -> Candidate<'_> {
        Candidate::Attributes(self)
    }

    fn differs_from(&self, original: Option<&Baseline>) -> bool {
        json_differs(self, original)
    }
}

impl FieldValue for EntityRef {
    fn candidate(&self) -> Candidate<'_> {
        Candidate::Entity(self)
    }

    /// Entities are canonical, so identity is the comparison.
    fn differs_from(&self, original: Option<&Baseline>) -> bool {
        !matches!(original, Some(Baseline::Entity(entity)) if entity == self)
    }
}

/// What a field needs from its record, without owning it.
#[derive(Clone)]
pub(crate) struct RecordLink {
    pub id: RelationshipId,
    pub relationship: Weak<Relationship>,
    pub tally: Weak<Tally>,
    pub record_type: Observable<Option<String>>,
    pub baselines: Rc<dyn BaselineStore>,
    pub server_errors: Rc<dyn ServerErrors>,
}

impl RecordLink {
    fn original(&self, field: &str) -> Option<Baseline> {
        let record_type = self.record_type.get()?;
        let found = self.baselines.original(&record_type, self.id, field);
        if found.is_none() {
            trace!(
                message = "field.baseline_missing",
                record = %self.id,
                record_type = %record_type,
                field
            );
        }
        found
    }

    fn tracks_changes(&self) -> bool {
        self.tally
            .upgrade()
            .is_some_and(|tally| tally.action().get() != Action::Add)
    }

    fn apply(&self, delta: Delta) {
        if delta.is_empty() {
            return;
        }
        if let Some(tally) = self.tally.upgrade() {
            tally.apply(delta);
        }
    }
}

/// Per-field state shared by a field's handles and its subscriptions.
pub struct FieldState {
    name: FieldName,
    full_name: String,
    record: RelationshipId,
    passive: bool,
    error: Observable<String>,
    has_error: Cell<bool>,
    changed: Cell<bool>,
    disposed: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl FieldState {
    #[must_use]
    pub fn name(&self) -> &FieldName {
        &self.name
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Current error text; empty means valid.
    #[must_use]
    pub fn error(&self) -> String {
        self.error.get()
    }

    /// Reactive error text.
    #[must_use]
    pub fn error_observable(&self) -> &Observable<String> {
        &self.error
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.has_error.get()
    }

    /// Whether the value currently differs from its baseline.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed.get()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Set the error text. An empty string clears the error.
    pub fn set_error(&self, error: impl Into<String>) {
        self.error.set(error.into());
    }

    pub(crate) fn report(&self, verdict: Result<(), Violation>, messages: &Messages) {
        match verdict {
            Ok(()) => self.set_error(String::new()),
            Err(violation) => self.set_error(violation.render(messages)),
        }
    }

    fn note_error(&self, has_error: bool) -> Delta {
        if self.has_error.replace(has_error) == has_error {
            return Delta::NONE;
        }
        debug!(
            message = "field.error",
            record = %self.record,
            field = %self.full_name,
            has_error
        );
        Delta::errors(if has_error { 1 } else { -1 })
    }

    fn note_changed(&self, changed: bool) -> Delta {
        if self.changed.replace(changed) == changed {
            return Delta::changes(0);
        }
        debug!(
            message = "field.changed",
            record = %self.record,
            field = %self.full_name,
            changed
        );
        Delta::changes(if changed { 1 } else { -1 })
    }

    fn hold(&self, subscription: Subscription) {
        self.subscriptions.borrow_mut().push(subscription);
    }

    /// Drop every subscription. Returns `false` if already disposed.
    pub fn dispose(&self) -> bool {
        if self.disposed.replace(true) {
            warn!(
                message = "field.dispose_twice",
                record = %self.record,
                field = %self.full_name
            );
            return false;
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        drop(subscriptions);
        true
    }

    /// Clear the error (balancing the tally), then dispose.
    pub(crate) fn retire(&self) {
        if self.disposed.get() {
            return;
        }
        if self.has_error() {
            self.set_error(String::new());
        }
        self.dispose();
    }
}

impl fmt::Debug for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldState")
            .field("name", &self.name)
            .field("error", &self.error.get())
            .field("changed", &self.changed.get())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

/// A reactive source augmented with error and dirty-tracking state.
///
/// Dereferences to the wrapped source, so reads and writes go through the
/// source's own API.
pub struct Field<R> {
    source: R,
    state: Rc<FieldState>,
}

impl<R: Clone> Clone for Field<R> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<R> Deref for Field<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.source
    }
}

impl<R: fmt::Debug> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("source", &self.source)
            .field("state", &self.state)
            .finish()
    }
}

impl<R> Field<R>
where
    R: Source,
    R::Value: FieldValue,
{
    pub(crate) fn attach(source: R, link: &RecordLink, spec: FieldSpec) -> Self {
        let FieldSpec {
            name,
            full_name,
            passive,
        } = spec;
        let full_name = full_name.unwrap_or_else(|| name.default_full_name());
        let seeded = link
            .server_errors
            .initial_error(link.id, &full_name)
            .unwrap_or_default();

        let state = Rc::new(FieldState {
            name,
            full_name,
            record: link.id,
            passive,
            has_error: Cell::new(!seeded.is_empty()),
            error: Observable::new(seeded),
            changed: Cell::new(false),
            disposed: Cell::new(false),
            subscriptions: RefCell::new(Vec::new()),
        });
        if state.has_error() {
            link.apply(Delta::errors(1));
        }

        let weak = Rc::downgrade(&state);
        let errors = link.clone();
        state.hold(state.error.subscribe(move |error: &String| {
            if let Some(state) = weak.upgrade() {
                errors.apply(state.note_error(!error.is_empty()));
            }
        }));

        if passive {
            return Self { source, state };
        }

        if let Some(kind) = state.name.kind() {
            let weak = Rc::downgrade(&state);
            let relationship = link.relationship.clone();
            state.hold(source.watch(move |value: &R::Value| {
                let (Some(state), Some(relationship)) = (weak.upgrade(), relationship.upgrade())
                else {
                    return;
                };
                validate::dispatch(kind, &state, &value.candidate(), &relationship);
            }));
        }

        if !link.tracks_changes() {
            return Self { source, state };
        }

        let weak = Rc::downgrade(&state);
        let changes = link.clone();
        state.hold(source.watch(move |value: &R::Value| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let original = changes.original(state.name.as_str());
            let changed = value.differs_from(original.as_ref());
            changes.apply(state.note_changed(changed));
        }));

        Self { source, state }
    }

    /// Run this field's validation handler against its current value.
    pub(crate) fn validate_now(&self, relationship: &Relationship) {
        if self.state.passive || self.state.is_disposed() {
            return;
        }
        if let Some(kind) = self.state.name.kind() {
            let value = self.source.current();
            validate::dispatch(kind, &self.state, &value.candidate(), relationship);
        }
    }
}

impl<R> Field<R> {
    /// The wrapped source.
    #[must_use]
    pub fn source(&self) -> &R {
        &self.source
    }

    #[must_use]
    pub fn state(&self) -> &Rc<FieldState> {
        &self.state
    }

    #[must_use]
    pub fn name(&self) -> &FieldName {
        self.state.name()
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        self.state.full_name()
    }

    #[must_use]
    pub fn error(&self) -> String {
        self.state.error()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.state.has_error()
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.state.is_changed()
    }

    pub fn set_error(&self, error: impl Into<String>) {
        self.state.set_error(error);
    }

    pub fn dispose(&self) -> bool {
        self.state.dispose()
    }
}

impl<R: Source> Source for Field<R> {
    type Value = R::Value;

    fn current(&self) -> R::Value {
        self.source.current()
    }

    fn watch(&self, f: impl Fn(&R::Value) + 'static) -> Subscription {
        self.source.watch(f)
    }
}
