#![forbid(unsafe_code)]

//! Core: reactive field validation and change tracking for relationship
//! records.
//!
//! A [`Relationship`] is a set of reactive fields. Every field carries an
//! error string and a dirty flag; transitions of either are aggregated into
//! the record's error count, `has_errors`, change count, and [`Action`].
//!
//! # Layout
//!
//! - [`validate`]: pure rules and the per-kind handler table.
//! - [`field`]: the extension that attaches error state, validation, and
//!   dirty tracking to any [`Source`](reled_reactive::Source).
//! - [`integer`], [`date`], [`attribute`], [`target`], [`record_type`]:
//!   typed values with their coercion rules.
//! - [`attributes`]: reconciles attribute fields against the link type.
//! - [`catalog`], [`baseline`], [`entity`], [`messages`]: collaborators,
//!   each a narrow trait with an in-memory implementation.
//!
//! # Invariants
//!
//! 1. `error_count` equals the number of attached fields with a non-empty
//!    error, at every observable point.
//! 2. `change_count` equals the number of fields that differ from their
//!    baseline; `action` is `edit` exactly when it is positive, unless the
//!    record was created as `add`.
//! 3. At most one name watch exists per (target entity, relationship).
//! 4. Every field is disposed at most once.

pub mod attribute;
pub mod attributes;
pub mod baseline;
pub mod catalog;
pub mod context;
pub mod date;
pub mod entity;
pub mod error;
pub mod field;
pub mod ids;
pub mod integer;
pub mod messages;
pub mod record_type;
pub mod relationship;
pub mod tally;
pub mod target;
pub mod validate;
pub mod watch;

pub use attribute::{AttrSnapshot, AttrValue, Attribute, AttributeCell};
pub use attributes::AttributeSet;
pub use baseline::{
    Baseline, BaselineMap, BaselineStore, NoBaselines, NoServerErrors, ServerErrorMap,
    ServerErrors,
};
pub use catalog::{
    AttrDescriptor, AttrKind, AttributeSchema, Cardinality, LinkTypes, StaticCatalog,
    TypeCatalog, TypeClassifier, TypeInfo,
};
pub use context::{Context, ContextBuilder};
pub use date::{DateParts, PartialDate};
pub use entity::{Entity, EntityCache, EntityData, EntityRef, EntityResolver, TargetInput};
pub use error::{ReledError, Result};
pub use field::{Field, FieldName, FieldSpec, FieldState, FieldValue};
pub use ids::{AttrRootId, LinkTypeId, RelationshipId};
pub use integer::Integer;
pub use messages::{MessageKey, Messages};
pub use record_type::RecordType;
pub use relationship::{Relationship, RelationshipInit};
pub use tally::Action;
pub use target::{DirectSwap, Target, TargetChanger};
pub use validate::{FieldKind, Violation};
pub use watch::NameWatchRegistry;
