//! Link-type catalog: type info, attribute schemas, and type classification.
//!
//! The editor consumes the catalog through three narrow traits, bundled as
//! [`LinkTypes`]. [`StaticCatalog`] is an in-memory implementation loaded from
//! JSON:
//!
//! ```json
//! {
//!   "link_types": {
//!     "148": { "descr": "performed {instrument}", "entity_types": ["artist", "recording"],
//!              "attrs": { "14": [0, null], "1": [0, 1] } }
//!   },
//!   "attributes": [
//!     { "name": "instrument", "root_id": 14, "kind": "multi_select" },
//!     { "name": "additional", "root_id": 1, "kind": "boolean" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{AttrRootId, LinkTypeId};

/// Allowed number of values for an attribute, as `[min, max]`.
///
/// A `max` of `None` (or `0` in serialized form) means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, Option<u32>)", into = "(u32, Option<u32>)")]
pub struct Cardinality {
    pub min: u32,
    pub max: Option<u32>,
}

impl Cardinality {
    #[must_use]
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Zero or more values.
    #[must_use]
    pub const fn optional() -> Self {
        Self::new(0, None)
    }
}

impl From<(u32, Option<u32>)> for Cardinality {
    fn from((min, max): (u32, Option<u32>)) -> Self {
        Self {
            min,
            max: max.filter(|m| *m > 0),
        }
    }
}

impl From<Cardinality> for (u32, Option<u32>) {
    fn from(c: Cardinality) -> Self {
        (c.min, c.max)
    }
}

/// Catalog entry for one link type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Phrase describing the type. Grouping types have none and cannot be
    /// selected on their own.
    #[serde(default)]
    pub descr: Option<String>,
    /// Entity types the relationship links, in order.
    #[serde(default)]
    pub entity_types: Vec<String>,
    /// Cardinality per root attribute allowed on this type.
    #[serde(default)]
    pub attrs: BTreeMap<AttrRootId, Cardinality>,
}

impl TypeInfo {
    /// Whether the type carries a descriptor (is a selectable sub-type).
    #[must_use]
    pub fn has_descr(&self) -> bool {
        self.descr.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// How raw attribute input is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    /// Truthiness of the input.
    Boolean,
    /// Free text.
    Text,
    /// Integer or null.
    Numeric,
    /// List of integer ids (the only kind with a countable value).
    MultiSelect,
}

/// One attribute in a link type's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrDescriptor {
    pub name: String,
    pub root_id: AttrRootId,
    pub kind: AttrKind,
}

impl AttrDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, root_id: AttrRootId, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            root_id,
            kind,
        }
    }
}

/// Type info lookup.
pub trait TypeCatalog {
    fn type_info(&self, link_type: LinkTypeId) -> Option<&TypeInfo>;
}

/// Attribute schema enumeration for a link type.
pub trait AttributeSchema {
    /// Attributes legal under `link_type`. Unknown types have none.
    fn attributes_for(&self, link_type: LinkTypeId) -> Vec<AttrDescriptor>;
}

/// Category of a link type, used as the record type for baselines.
pub trait TypeClassifier {
    fn classify(&self, link_type: LinkTypeId) -> Option<String>;
}

/// Everything the editor needs from the catalog.
pub trait LinkTypes: TypeCatalog + AttributeSchema + TypeClassifier {}

impl<T: TypeCatalog + AttributeSchema + TypeClassifier> LinkTypes for T {}

/// In-memory catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    link_types: BTreeMap<LinkTypeId, TypeInfo>,
    #[serde(default)]
    attributes: Vec<AttrDescriptor>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_link_type(mut self, id: LinkTypeId, info: TypeInfo) -> Self {
        self.link_types.insert(id, info);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, descriptor: AttrDescriptor) -> Self {
        self.attributes.push(descriptor);
        self
    }

    /// Descriptor registered under `name`.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&AttrDescriptor> {
        self.attributes.iter().find(|d| d.name == name)
    }
}

impl TypeCatalog for StaticCatalog {
    fn type_info(&self, link_type: LinkTypeId) -> Option<&TypeInfo> {
        self.link_types.get(&link_type)
    }
}

impl AttributeSchema for StaticCatalog {
    fn attributes_for(&self, link_type: LinkTypeId) -> Vec<AttrDescriptor> {
        let Some(info) = self.link_types.get(&link_type) else {
            return Vec::new();
        };
        self.attributes
            .iter()
            .filter(|d| info.attrs.contains_key(&d.root_id))
            .cloned()
            .collect()
    }
}

impl TypeClassifier for StaticCatalog {
    fn classify(&self, link_type: LinkTypeId) -> Option<String> {
        let info = self.link_types.get(&link_type)?;
        if info.entity_types.is_empty() {
            return None;
        }
        Some(info.entity_types.join("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "link_types": {
            "148": { "descr": "performed", "entity_types": ["artist", "recording"],
                     "attrs": { "14": [1, 3], "1": [0, 0] } },
            "122": { "entity_types": ["artist", "recording"] }
        },
        "attributes": [
            { "name": "instrument", "root_id": 14, "kind": "multi_select" },
            { "name": "additional", "root_id": 1, "kind": "boolean" },
            { "name": "vocal", "root_id": 3, "kind": "multi_select" }
        ]
    }"#;

    #[test]
    fn loads_from_json() {
        let catalog = StaticCatalog::from_json(JSON).unwrap();
        let info = catalog.type_info(LinkTypeId(148)).unwrap();
        assert!(info.has_descr());
        assert_eq!(info.attrs[&AttrRootId(14)], Cardinality::new(1, Some(3)));
        assert_eq!(info.attrs[&AttrRootId(1)], Cardinality::optional());
        assert!(!catalog.type_info(LinkTypeId(122)).unwrap().has_descr());
        assert!(catalog.type_info(LinkTypeId(1)).is_none());
    }

    #[test]
    fn attributes_follow_type_roots() {
        let catalog = StaticCatalog::from_json(JSON).unwrap();
        let names: Vec<_> = catalog
            .attributes_for(LinkTypeId(148))
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["instrument", "additional"]);
        assert!(catalog.attributes_for(LinkTypeId(122)).is_empty());
        assert!(catalog.attributes_for(LinkTypeId(9)).is_empty());
    }

    #[test]
    fn classifies_by_entity_types() {
        let catalog = StaticCatalog::from_json(JSON).unwrap();
        assert_eq!(
            catalog.classify(LinkTypeId(148)).as_deref(),
            Some("artist-recording")
        );
        assert_eq!(catalog.classify(LinkTypeId(9)), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(StaticCatalog::from_json("{\"link_types\": 5}").is_err());
    }

    #[test]
    fn empty_descr_is_not_selectable() {
        let info = TypeInfo {
            descr: Some(String::new()),
            ..TypeInfo::default()
        };
        assert!(!info.has_descr());
    }
}
