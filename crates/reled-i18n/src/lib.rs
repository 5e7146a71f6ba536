#![forbid(unsafe_code)]

//! Localized message catalog with `{placeholder}` interpolation.
//!
//! A [`Catalog`] maps message keys to templates. Templates name their
//! arguments in braces (`"at most {max} values, got {n}"`); [`interpolate`]
//! fills them in. Placeholders without a matching argument, and unbalanced
//! braces, are left in the output verbatim.

use std::collections::HashMap;
use std::fmt::Display;

/// A set of message templates keyed by message id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(key, template);
        self
    }

    /// Insert or replace a template.
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.entries.insert(key.into(), template.into());
    }

    /// Raw template for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Overlay `other` on top of this catalog; its templates win.
    pub fn merge(&mut self, other: Catalog) {
        self.entries.extend(other.entries);
    }

    /// Template for `key` with `args` substituted.
    #[must_use]
    pub fn format(&self, key: &str, args: &[(&str, &dyn Display)]) -> Option<String> {
        self.get(key).map(|template| interpolate(template, args))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Replace every `{name}` in `template` whose name appears in `args`.
#[must_use]
pub fn interpolate(template: &str, args: &[(&str, &dyn Display)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match args.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(&value.to_string()),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_named_arguments() {
        let text = interpolate("at most {max}, got {n}", &[("max", &3), ("n", &4)]);
        assert_eq!(text, "at most 3, got 4");
    }

    #[test]
    fn repeated_placeholder_is_replaced_everywhere() {
        assert_eq!(interpolate("{a}-{a}", &[("a", &"x")]), "x-x");
    }

    #[test]
    fn unknown_placeholder_left_verbatim() {
        assert_eq!(interpolate("hello {who}", &[("n", &1)]), "hello {who}");
    }

    #[test]
    fn unbalanced_brace_left_verbatim() {
        assert_eq!(interpolate("oops {max", &[("max", &1)]), "oops {max");
        assert_eq!(interpolate("}{", &[]), "}{");
    }

    #[test]
    fn catalog_format_and_merge() {
        let mut catalog = Catalog::new().with_entry("too_many", "max {max}");
        assert_eq!(
            catalog.format("too_many", &[("max", &2)]).as_deref(),
            Some("max 2")
        );
        assert!(catalog.format("missing", &[]).is_none());

        catalog.merge(Catalog::from_iter([("too_many", "höchstens {max}")]));
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.format("too_many", &[("max", &2)]).as_deref(),
            Some("höchstens 2")
        );
    }
}
