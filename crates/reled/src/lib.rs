#![forbid(unsafe_code)]

//! Relationship editor public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use reled_core::{
    Action, Context, DateParts, EntityData, EntityRef, LinkTypeId, ReledError, Relationship,
    RelationshipId, RelationshipInit, Result, StaticCatalog,
};

pub mod prelude {
    pub use reled_core as core;
    pub use reled_i18n as i18n;
    pub use reled_reactive as reactive;

    pub use reled_core::{
        Action, BaselineMap, Context, DateParts, EntityCache, EntityData, EntityRef,
        LinkTypeId, Relationship, RelationshipId, RelationshipInit, ServerErrorMap,
        StaticCatalog,
    };
    pub use reled_reactive::{Observable, Source, Subscription};
}
