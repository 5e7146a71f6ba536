//! Validation registry: one handler per field kind.
//!
//! The rules themselves are pure functions returning `Result<(), Violation>`.
//! Handlers adapt them to fields: they read sibling state from the record
//! where needed and write the rendered verdict into the field's error.
//!
//! Dispatch goes through [`HANDLERS`], a table indexed by [`FieldKind`] that
//! is fixed at compile time. Attribute sub-fields have no kind and are never
//! dispatched; the `attributes` handler sets their errors.

use std::rc::Rc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::attribute::{AttrSnapshot, AttrValue};
use crate::catalog::{Cardinality, TypeCatalog};
use crate::date::DateParts;
use crate::entity::EntityRef;
use crate::field::FieldState;
use crate::ids::{LinkTypeId, RelationshipId};
use crate::messages::{MessageKey, Messages};
use crate::relationship::Relationship;
use crate::watch::NameWatchRegistry;

/// Record-level field kinds with a validation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    LinkType,
    BeginDate,
    EndDate,
    Ended,
    Direction,
    Attributes,
    Target,
}

impl FieldKind {
    pub const COUNT: usize = 7;

    pub const ALL: [Self; Self::COUNT] = [
        Self::LinkType,
        Self::BeginDate,
        Self::EndDate,
        Self::Ended,
        Self::Direction,
        Self::Attributes,
        Self::Target,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinkType => "link_type",
            Self::BeginDate => "begin_date",
            Self::EndDate => "end_date",
            Self::Ended => "ended",
            Self::Direction => "direction",
            Self::Attributes => "attributes",
            Self::Target => "target",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Borrowed view of a field value, as seen by its handler.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    LinkType(Option<LinkTypeId>),
    Date(&'a DateParts),
    Json(&'a Value),
    Attributes(&'a AttrSnapshot),
    Entity(&'a EntityRef),
    Attribute(&'a AttrValue),
}

/// A broken domain rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    NoType,
    NoSubtype,
    InvalidDate,
    InvalidEndDate,
    InvalidValue,
    AttributeNotSupported,
    AttributeRequired,
    AttributeTooMany { max: u32, n: usize },
    RequiredField,
}

impl Violation {
    #[must_use]
    pub const fn key(self) -> MessageKey {
        match self {
            Self::NoType => MessageKey::SelectType,
            Self::NoSubtype => MessageKey::SelectSubtype,
            Self::InvalidDate => MessageKey::InvalidDate,
            Self::InvalidEndDate => MessageKey::InvalidEndDate,
            Self::InvalidValue => MessageKey::InvalidValue,
            Self::AttributeNotSupported => MessageKey::AttributeNotSupported,
            Self::AttributeRequired => MessageKey::AttributeRequired,
            Self::AttributeTooMany { .. } => MessageKey::AttributeTooMany,
            Self::RequiredField => MessageKey::RequiredField,
        }
    }

    /// Error text for this violation.
    #[must_use]
    pub fn render(self, messages: &Messages) -> String {
        match self {
            Self::AttributeTooMany { max, n } => {
                messages.format(self.key(), &[("max", &max), ("n", &n)])
            }
            _ => messages.text(self.key()),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Gregorian leap year.
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Days in `month` (1-12) of `year`; 0 for an out-of-range month.
#[must_use]
pub const fn days_in_month(year: i32, month: i32) -> i32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// A type must be chosen, known, and a selectable sub-type.
pub fn check_link_type<C>(catalog: &C, link_type: Option<LinkTypeId>) -> Result<(), Violation>
where
    C: TypeCatalog + ?Sized,
{
    let info = link_type
        .and_then(|id| catalog.type_info(id))
        .ok_or(Violation::NoType)?;
    if info.has_descr() {
        Ok(())
    } else {
        Err(Violation::NoSubtype)
    }
}

/// An all-absent date is valid; otherwise it must name a real calendar
/// year, year-month, or year-month-day.
pub fn check_date(date: &DateParts) -> Result<(), Violation> {
    if date.is_empty() {
        return Ok(());
    }
    let Some(year) = date.year.filter(|y| *y >= 1) else {
        return Err(Violation::InvalidDate);
    };
    match (date.month, date.day) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(Violation::InvalidDate),
        (Some(month), _) if !(1..=12).contains(&month) => Err(Violation::InvalidDate),
        (Some(_), None) => Ok(()),
        (Some(month), Some(day)) if day < 1 || day > days_in_month(year, month) => {
            Err(Violation::InvalidDate)
        }
        (Some(_), Some(_)) => Ok(()),
    }
}

/// `end` must not precede `begin`.
///
/// Components are compared year, then month, then day. The first pair where
/// both sides are present and differ decides. A pair with exactly one side
/// absent ends the comparison without a violation.
pub fn check_date_order(begin: &DateParts, end: &DateParts) -> Result<(), Violation> {
    let pairs = [
        (begin.year, end.year),
        (begin.month, end.month),
        (begin.day, end.day),
    ];
    for pair in pairs {
        match pair {
            (Some(b), Some(e)) if e < b => return Err(Violation::InvalidEndDate),
            (Some(b), Some(e)) if e > b => return Ok(()),
            (Some(_), Some(_)) | (None, None) => {}
            _ => return Ok(()),
        }
    }
    Ok(())
}

/// `ended` must be a JSON boolean.
pub fn check_ended(value: &Value) -> Result<(), Violation> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(Violation::InvalidValue)
    }
}

/// `direction` must be the string `"forward"` or `"backward"`.
pub fn check_direction(value: &Value) -> Result<(), Violation> {
    match value.as_str() {
        Some("forward" | "backward") => Ok(()),
        _ => Err(Violation::InvalidValue),
    }
}

/// Value count within `[min, max]`. Only list values have a count; any
/// other value fails a non-zero minimum and is never "too many".
pub fn check_cardinality(value: &AttrValue, bounds: Cardinality) -> Result<(), Violation> {
    let count = value.count();
    let min = bounds.min as usize;
    if bounds.min > 0 && count.is_none_or(|n| n < min) {
        return Err(Violation::AttributeRequired);
    }
    match (bounds.max, count) {
        (Some(max), Some(n)) if n > max as usize => Err(Violation::AttributeTooMany { max, n }),
        _ => Ok(()),
    }
}

pub fn check_target_name(name: &str) -> Result<(), Violation> {
    if name.is_empty() {
        Err(Violation::RequiredField)
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Adapts a rule to a field: `(field, candidate, record)`.
pub type Handler = fn(&Rc<FieldState>, &Candidate<'_>, &Relationship);

/// Handler table, indexed by [`FieldKind`].
pub static HANDLERS: [Handler; FieldKind::COUNT] = [
    link_type,
    begin_date,
    end_date,
    ended,
    direction,
    attributes,
    target,
];

#[must_use]
pub fn handler(kind: FieldKind) -> Handler {
    HANDLERS[kind.index()]
}

/// Run the handler for `kind`.
pub fn dispatch(kind: FieldKind, field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    trace!(
        message = "validate.dispatch",
        record = %rel.id(),
        kind = kind.as_str()
    );
    handler(kind)(field, candidate, rel);
}

fn mismatch(field: &FieldState, candidate: &Candidate<'_>) {
    warn!(
        message = "validate.mismatch",
        field = field.full_name(),
        candidate = ?candidate
    );
}

fn link_type(field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    let Candidate::LinkType(id) = candidate else {
        return mismatch(field, candidate);
    };
    let verdict = check_link_type(&**rel.context().catalog(), *id);
    field.report(verdict, rel.messages());
}

fn begin_date(field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    let Candidate::Date(date) = candidate else {
        return mismatch(field, candidate);
    };
    field.report(check_date(date), rel.messages());
}

fn end_date(field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    let Candidate::Date(date) = candidate else {
        return mismatch(field, candidate);
    };
    let begin = rel.begin_date();
    let verdict = check_date(date).and_then(|()| {
        if begin.has_error() {
            Ok(())
        } else {
            check_date_order(&begin.get(), date)
        }
    });
    field.report(verdict, rel.messages());
}

fn ended(field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    let Candidate::Json(value) = candidate else {
        return mismatch(field, candidate);
    };
    field.report(check_ended(value), rel.messages());
}

fn direction(field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    let Candidate::Json(value) = candidate else {
        return mismatch(field, candidate);
    };
    field.report(check_direction(value), rel.messages());
}

/// Checks every attached attribute against the current type. The record
/// field itself never carries an error.
fn attributes(field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    if !matches!(candidate, Candidate::Attributes(_)) {
        return mismatch(field, candidate);
    }
    let catalog = rel.context().catalog();
    let Some(info) = rel.link_type().get().and_then(|id| catalog.type_info(id)) else {
        return;
    };
    for attribute in rel.attributes().fields() {
        let verdict = match info.attrs.get(&attribute.descriptor().root_id) {
            None => Err(Violation::AttributeNotSupported),
            Some(bounds) => check_cardinality(&attribute.get(), *bounds),
        };
        attribute.state().report(verdict, rel.messages());
    }
}

/// Checks the name now and watches it for this record, replacing any
/// earlier watch on the same entity.
fn target(field: &Rc<FieldState>, candidate: &Candidate<'_>, rel: &Relationship) {
    let Candidate::Entity(entity) = candidate else {
        return mismatch(field, candidate);
    };
    let messages = rel.context().messages_rc();
    field.report(check_target_name(&entity.name().get()), &messages);
    watch_target_name(field, entity, rel.id(), rel.context().watchers(), messages);
}

/// Re-check `field` whenever `entity` is renamed.
pub(crate) fn watch_target_name(
    field: &Rc<FieldState>,
    entity: &EntityRef,
    id: RelationshipId,
    watchers: &NameWatchRegistry,
    messages: Rc<Messages>,
) {
    let weak = Rc::downgrade(field);
    watchers.watch(entity, id, move |name: &String| {
        if let Some(field) = weak.upgrade() {
            field.report(check_target_name(name), &messages);
        }
    });
}
