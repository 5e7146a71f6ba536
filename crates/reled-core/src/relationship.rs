//! The relationship record: the unit of editing.
//!
//! A [`Relationship`] owns every field. Fields reach back to it only through
//! weak references, for validation handlers that read sibling state and for
//! the shared [`Tally`] that aggregates their error and dirty transitions.
//!
//! Construction wires, in order: the link type, the record type derived
//! from it, the scalar fields, the attribute set (which follows the link
//! type), the target and its name watch, and the begin-date watch that
//! re-checks the end date. No handler runs during construction;
//! [`Relationship::revalidate`] runs all of them once. A rename of the
//! target is still checked from the start.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use reled_reactive::{Observable, Subscription};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::attributes::AttributeSet;
use crate::context::Context;
use crate::date::PartialDate;
use crate::entity::{EntityData, EntityRef, TargetInput};
use crate::error::{ReledError, Result};
use crate::field::{Field, FieldSpec, FieldState, RecordLink};
use crate::ids::{LinkTypeId, RelationshipId};
use crate::messages::Messages;
use crate::record_type::RecordType;
use crate::tally::{Action, Tally};
use crate::target::Target;
use crate::validate::{self, FieldKind};

fn default_ended() -> Value {
    Value::Bool(false)
}

fn default_direction() -> Value {
    Value::String("forward".to_owned())
}

/// Raw record data.
///
/// ```json
/// { "id": 7, "link_type": 148, "begin_date": {"year": 1999},
///   "attributes": {"instrument": [229]},
///   "target": {"gid": "b8a7c51f", "type": "recording", "name": "Song"} }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationshipInit {
    pub id: RelationshipId,
    #[serde(default)]
    pub link_type: Option<LinkTypeId>,
    #[serde(default)]
    pub begin_date: Value,
    #[serde(default)]
    pub end_date: Value,
    #[serde(default = "default_ended")]
    pub ended: Value,
    #[serde(default = "default_direction")]
    pub direction: Value,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    pub target: EntityData,
    /// A record not yet known to the server.
    #[serde(default)]
    pub is_new: bool,
}

impl RelationshipInit {
    #[must_use]
    pub fn new(id: RelationshipId, target: EntityData) -> Self {
        Self {
            id,
            link_type: None,
            begin_date: Value::Null,
            end_date: Value::Null,
            ended: default_ended(),
            direction: default_direction(),
            attributes: BTreeMap::new(),
            target,
            is_new: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_link_type(mut self, link_type: LinkTypeId) -> Self {
        self.link_type = Some(link_type);
        self
    }

    #[must_use]
    pub fn with_begin_date(mut self, date: Value) -> Self {
        self.begin_date = date;
        self
    }

    #[must_use]
    pub fn with_end_date(mut self, date: Value) -> Self {
        self.end_date = date;
        self
    }

    #[must_use]
    pub fn with_ended(mut self, ended: Value) -> Self {
        self.ended = ended;
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: impl Into<Value>) -> Self {
        self.direction = direction.into();
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Mark as new: the record starts in `add` and skips dirty tracking.
    #[must_use]
    pub fn new_record(mut self) -> Self {
        self.is_new = true;
        self
    }
}

/// An editable relationship and its fields.
pub struct Relationship {
    id: RelationshipId,
    cx: Context,
    tally: Rc<Tally>,
    link_type: Field<Observable<Option<LinkTypeId>>>,
    record_type: RecordType,
    begin_date: Field<PartialDate>,
    end_date: Field<PartialDate>,
    ended: Field<Observable<Value>>,
    direction: Field<Observable<Value>>,
    attributes: Field<AttributeSet>,
    target: Field<Target>,
    internal: RefCell<Vec<Subscription>>,
    discarded: Cell<bool>,
}

impl Relationship {
    /// Build a record from raw data.
    ///
    /// # Errors
    ///
    /// [`ReledError::UnresolvedTarget`] if the target data does not resolve.
    pub fn new(init: RelationshipInit, cx: &Context) -> Result<Rc<Self>> {
        let entity = cx
            .resolver()
            .resolve(&init.target)
            .ok_or_else(|| ReledError::unresolved(init.target.gid.clone()))?;
        let action = if init.is_new {
            Action::Add
        } else {
            Action::Unchanged
        };
        let tally = Rc::new(Tally::new(action));
        Ok(Rc::new_cyclic(|weak| {
            Self::assemble(weak, init, cx.clone(), tally, entity)
        }))
    }

    fn assemble(
        weak: &Weak<Self>,
        init: RelationshipInit,
        cx: Context,
        tally: Rc<Tally>,
        entity: EntityRef,
    ) -> Self {
        let id = init.id;
        let link_type_value = Observable::new(init.link_type);
        let record_type = RecordType::new(&link_type_value, Rc::clone(cx.catalog()));
        let link = RecordLink {
            id,
            relationship: weak.clone(),
            tally: Rc::downgrade(&tally),
            record_type: record_type.observable().clone(),
            baselines: Rc::clone(cx.baselines()),
            server_errors: Rc::clone(cx.server_errors()),
        };
        let known = FieldSpec::known;

        let link_type = Field::attach(link_type_value.clone(), &link, known(FieldKind::LinkType));
        let begin_date = Field::attach(
            PartialDate::from_json(&init.begin_date),
            &link,
            known(FieldKind::BeginDate),
        );
        let end_date = Field::attach(
            PartialDate::from_json(&init.end_date),
            &link,
            known(FieldKind::EndDate),
        );
        let ended = Field::attach(Observable::new(init.ended), &link, known(FieldKind::Ended));
        let direction = Field::attach(
            Observable::new(init.direction),
            &link,
            known(FieldKind::Direction),
        );

        let set = AttributeSet::new(
            link_type_value,
            Rc::clone(cx.catalog()),
            link.clone(),
            &init.attributes,
        );
        let attributes = Field::attach(set, &link, known(FieldKind::Attributes));
        attributes.follow_link_type();

        let target = Field::attach(
            Target::new(
                entity.clone(),
                id,
                Rc::clone(cx.resolver()),
                Rc::clone(cx.changer()),
                Rc::clone(cx.watchers()),
            ),
            &link,
            known(FieldKind::Target),
        );
        validate::watch_target_name(
            target.state(),
            &entity,
            id,
            cx.watchers(),
            cx.messages_rc(),
        );

        let rel = weak.clone();
        let begin_watch = begin_date.subscribe(move |_| {
            if let Some(rel) = rel.upgrade() {
                rel.end_date.validate_now(&rel);
            }
        });

        Self {
            id,
            cx,
            tally,
            link_type,
            record_type,
            begin_date,
            end_date,
            ended,
            direction,
            attributes,
            target,
            internal: RefCell::new(vec![begin_watch]),
            discarded: Cell::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationshipId {
        self.id
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.cx
    }

    #[must_use]
    pub fn messages(&self) -> &Messages {
        self.cx.messages()
    }

    #[must_use]
    pub fn link_type(&self) -> &Field<Observable<Option<LinkTypeId>>> {
        &self.link_type
    }

    /// Category derived from the link type; keys baseline lookups.
    #[must_use]
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    #[must_use]
    pub fn begin_date(&self) -> &Field<PartialDate> {
        &self.begin_date
    }

    #[must_use]
    pub fn end_date(&self) -> &Field<PartialDate> {
        &self.end_date
    }

    #[must_use]
    pub fn ended(&self) -> &Field<Observable<Value>> {
        &self.ended
    }

    #[must_use]
    pub fn direction(&self) -> &Field<Observable<Value>> {
        &self.direction
    }

    #[must_use]
    pub fn attributes(&self) -> &Field<AttributeSet> {
        &self.attributes
    }

    #[must_use]
    pub fn target(&self) -> &Field<Target> {
        &self.target
    }

    /// `add`, `edit`, or unchanged.
    #[must_use]
    pub fn action(&self) -> &Observable<Action> {
        self.tally.action()
    }

    /// True while any field carries an error.
    #[must_use]
    pub fn has_errors(&self) -> &Observable<bool> {
        self.tally.has_errors()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.tally.error_count()
    }

    #[must_use]
    pub fn change_count(&self) -> usize {
        self.tally.change_count()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.discarded.get() {
            return Err(ReledError::Discarded { id: self.id });
        }
        Ok(())
    }

    /// Run every field's handler once against its current value.
    pub fn revalidate(&self) -> Result<()> {
        self.ensure_live()?;
        self.link_type.validate_now(self);
        self.begin_date.validate_now(self);
        self.end_date.validate_now(self);
        self.ended.validate_now(self);
        self.direction.validate_now(self);
        self.attributes.validate_now(self);
        self.target.validate_now(self);
        Ok(())
    }

    /// Point the record at another entity.
    pub fn retarget(&self, input: impl Into<TargetInput>) -> Result<bool> {
        self.ensure_live()?;
        self.target.write(input)
    }

    /// Write attribute values legal under the current link type.
    pub fn write_attributes(&self, values: &BTreeMap<String, Value>) -> Result<()> {
        self.ensure_live()?;
        self.attributes.write(values);
        Ok(())
    }

    fn states(&self) -> [&Rc<FieldState>; FieldKind::COUNT] {
        [
            self.link_type.state(),
            self.begin_date.state(),
            self.end_date.state(),
            self.ended.state(),
            self.direction.state(),
            self.attributes.state(),
            self.target.state(),
        ]
    }

    /// Tear the record down: clear every error, dispose every field and
    /// subscription, and release name watchers. Later calls do nothing.
    pub fn discard(&self) {
        if self.discarded.replace(true) {
            return;
        }
        let watches = self.cx.watchers().release_all(self.id);
        self.internal.borrow_mut().clear();
        self.record_type.dispose();
        let attributes = self.attributes.len();
        self.attributes.clear();
        for state in self.states() {
            state.retire();
        }
        debug!(
            message = "relationship.discard",
            record = %self.id,
            attributes,
            watches
        );
    }

    #[must_use]
    pub fn is_discarded(&self) -> bool {
        self.discarded.get()
    }
}

impl Drop for Relationship {
    fn drop(&mut self) {
        self.cx.watchers().release_all(self.id);
    }
}

impl fmt::Debug for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relationship")
            .field("id", &self.id)
            .field("link_type", &self.link_type.get())
            .field("action", &self.tally.action().get())
            .field("errors", &self.tally.error_count())
            .field("changes", &self.tally.change_count())
            .field("discarded", &self.discarded.get())
            .finish()
    }
}
