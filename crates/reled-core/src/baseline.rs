//! Server-known state: field baselines and server-reported errors.

use std::collections::HashMap;

use serde_json::Value;

use crate::entity::EntityRef;
use crate::error::Result;
use crate::ids::RelationshipId;

/// A field's server-known original value.
#[derive(Debug, Clone, PartialEq)]
pub enum Baseline {
    /// Compared by deep equality with the field's serialized value.
    Value(Value),
    /// Compared by entity identity.
    Entity(EntityRef),
}

/// Lookup of original values by record type, record id, and field name.
pub trait BaselineStore {
    /// `None` means the field has no recorded original value.
    fn original(&self, record_type: &str, id: RelationshipId, field: &str) -> Option<Baseline>;
}

/// Store with no baselines at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaselines;

impl BaselineStore for NoBaselines {
    fn original(&self, _: &str, _: RelationshipId, _: &str) -> Option<Baseline> {
        None
    }
}

/// In-memory baseline store.
///
/// JSON form is `{record_type: {record_id: {field: value}}}`. Entity
/// baselines cannot be expressed in JSON; add them with
/// [`insert_entity`](Self::insert_entity).
#[derive(Debug, Clone, Default)]
pub struct BaselineMap {
    records: HashMap<(String, RelationshipId), HashMap<String, Baseline>>,
}

impl BaselineMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<RelationshipId, HashMap<String, Value>>> =
            serde_json::from_str(json)?;
        let mut map = Self::new();
        for (record_type, records) in raw {
            for (id, fields) in records {
                for (field, value) in fields {
                    map.insert_value(record_type.clone(), id, field, value);
                }
            }
        }
        Ok(map)
    }

    pub fn insert_value(
        &mut self,
        record_type: impl Into<String>,
        id: RelationshipId,
        field: impl Into<String>,
        value: Value,
    ) {
        self.insert(record_type.into(), id, field.into(), Baseline::Value(value));
    }

    pub fn insert_entity(
        &mut self,
        record_type: impl Into<String>,
        id: RelationshipId,
        field: impl Into<String>,
        entity: EntityRef,
    ) {
        self.insert(record_type.into(), id, field.into(), Baseline::Entity(entity));
    }

    fn insert(&mut self, record_type: String, id: RelationshipId, field: String, baseline: Baseline) {
        self.records
            .entry((record_type, id))
            .or_default()
            .insert(field, baseline);
    }
}

impl BaselineStore for BaselineMap {
    fn original(&self, record_type: &str, id: RelationshipId, field: &str) -> Option<Baseline> {
        self.records
            .get(&(record_type.to_owned(), id))?
            .get(field)
            .cloned()
    }
}

/// Errors the server reported for a record, keyed by full field name.
pub trait ServerErrors {
    fn initial_error(&self, id: RelationshipId, field: &str) -> Option<String>;
}

/// No server-reported errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServerErrors;

impl ServerErrors for NoServerErrors {
    fn initial_error(&self, _: RelationshipId, _: &str) -> Option<String> {
        None
    }
}

/// In-memory server errors. JSON form is `{record_id: {field: message}}`.
#[derive(Debug, Clone, Default)]
pub struct ServerErrorMap {
    errors: HashMap<(RelationshipId, String), String>,
}

impl ServerErrorMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<RelationshipId, HashMap<String, String>> = serde_json::from_str(json)?;
        let mut map = Self::new();
        for (id, fields) in raw {
            for (field, message) in fields {
                map.insert(id, field, message);
            }
        }
        Ok(map)
    }

    pub fn insert(&mut self, id: RelationshipId, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert((id, field.into()), message.into());
    }
}

impl ServerErrors for ServerErrorMap {
    fn initial_error(&self, id: RelationshipId, field: &str) -> Option<String> {
        self.errors
            .get(&(id, field.to_owned()))
            .filter(|message| !message.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use serde_json::json;

    #[test]
    fn json_baselines_are_keyed_by_type_id_field() {
        let map = BaselineMap::from_json(
            r#"{"artist-recording": {"7": {"direction": "forward", "ended": false}}}"#,
        )
        .unwrap();
        assert_eq!(
            map.original("artist-recording", RelationshipId(7), "direction"),
            Some(Baseline::Value(json!("forward")))
        );
        assert_eq!(map.original("artist-recording", RelationshipId(8), "direction"), None);
        assert_eq!(map.original("artist-work", RelationshipId(7), "direction"), None);
        assert_eq!(map.original("artist-recording", RelationshipId(7), "target"), None);
    }

    #[test]
    fn entity_baselines_compare_by_identity() {
        let entity = EntityRef::new(Entity::new("w1", "work", "Song"));
        let mut map = BaselineMap::new();
        map.insert_entity("artist-work", RelationshipId(1), "target", entity.clone());
        assert_eq!(
            map.original("artist-work", RelationshipId(1), "target"),
            Some(Baseline::Entity(entity))
        );
    }

    #[test]
    fn server_errors_from_json() {
        let errors = ServerErrorMap::from_json(r#"{"3": {"attrs.instrument": "bad", "ended": ""}}"#).unwrap();
        assert_eq!(
            errors.initial_error(RelationshipId(3), "attrs.instrument").as_deref(),
            Some("bad")
        );
        assert_eq!(errors.initial_error(RelationshipId(3), "ended"), None);
        assert_eq!(NoServerErrors.initial_error(RelationshipId(3), "ended"), None);
    }
}
