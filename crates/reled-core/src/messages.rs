//! Error message templates.
//!
//! Templates come from a [`reled_i18n::Catalog`] keyed by [`MessageKey::id`].
//! Keys missing from the catalog fall back to built-in English text.

use std::collections::HashMap;
use std::fmt::Display;

use reled_i18n::{Catalog, interpolate};

use crate::error::Result;

/// Every message the validators can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    SelectType,
    SelectSubtype,
    InvalidDate,
    InvalidEndDate,
    InvalidValue,
    AttributeNotSupported,
    AttributeRequired,
    /// Takes `{max}` and `{n}`.
    AttributeTooMany,
    RequiredField,
}

impl MessageKey {
    pub const ALL: [Self; 9] = [
        Self::SelectType,
        Self::SelectSubtype,
        Self::InvalidDate,
        Self::InvalidEndDate,
        Self::InvalidValue,
        Self::AttributeNotSupported,
        Self::AttributeRequired,
        Self::AttributeTooMany,
        Self::RequiredField,
    ];

    /// Catalog key.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::SelectType => "select_type",
            Self::SelectSubtype => "select_subtype",
            Self::InvalidDate => "invalid_date",
            Self::InvalidEndDate => "invalid_end_date",
            Self::InvalidValue => "invalid_value",
            Self::AttributeNotSupported => "attribute_not_supported",
            Self::AttributeRequired => "attribute_required",
            Self::AttributeTooMany => "attribute_too_many",
            Self::RequiredField => "required_field",
        }
    }

    const fn english(self) -> &'static str {
        match self {
            Self::SelectType => "Please select a relationship type.",
            Self::SelectSubtype => {
                "Please select a subtype of the currently selected relationship type. \
                 The selected relationship type is only used for grouping subtypes."
            }
            Self::InvalidDate => "The date you've entered is not valid.",
            Self::InvalidEndDate => "The end date cannot precede the begin date.",
            Self::InvalidValue => "Invalid value.",
            Self::AttributeNotSupported => {
                "This attribute is not supported for the selected relationship type."
            }
            Self::AttributeRequired => "This attribute is required.",
            Self::AttributeTooMany => {
                "This attribute can only be specified {max} times. You specified {n}."
            }
            Self::RequiredField => "Required field.",
        }
    }
}

/// Localized message lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    catalog: Catalog,
}

impl Messages {
    /// Built-in English messages only.
    #[must_use]
    pub fn english() -> Self {
        Self::default()
    }

    /// Messages from `catalog`, falling back to English per key.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Overrides from a flat JSON object `{key: template}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::with_catalog(entries.into_iter().collect()))
    }

    /// Template for `key`.
    #[must_use]
    pub fn template(&self, key: MessageKey) -> &str {
        self.catalog.get(key.id()).unwrap_or(key.english())
    }

    /// Message text for `key` with no arguments.
    #[must_use]
    pub fn text(&self, key: MessageKey) -> String {
        self.template(key).to_owned()
    }

    /// Message text for `key` with placeholders filled.
    #[must_use]
    pub fn format(&self, key: MessageKey, args: &[(&str, &dyn Display)]) -> String {
        interpolate(self.template(key), args)
    }
}
