//! Attribute values and the reactive cell behind each attribute field.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use reled_reactive::{Observable, Source, Subscription};
use serde::Serialize;
use serde_json::Value;

use crate::catalog::{AttrDescriptor, AttrKind};
use crate::field::Field;
use crate::integer::coerce_integer;

/// A coerced attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Number(Option<i32>),
    Text(String),
    /// Sorted, deduplicated attribute value ids.
    List(Vec<i32>),
}

impl AttrValue {
    /// Number of values, for list values only.
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::List(values) => Some(values.len()),
            _ => None,
        }
    }
}

/// Every attached attribute's value, by attribute name.
pub type AttrSnapshot = BTreeMap<String, AttrValue>;

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Coerce raw input according to `kind`.
#[must_use]
pub fn coerce_attr(kind: AttrKind, raw: &Value) -> AttrValue {
    match kind {
        AttrKind::Boolean => AttrValue::Flag(truthy(raw)),
        AttrKind::Text => AttrValue::Text(match raw {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        AttrKind::Numeric => AttrValue::Number(coerce_integer(raw)),
        AttrKind::MultiSelect => {
            let mut ids: Vec<i32> = match raw {
                Value::Null => Vec::new(),
                Value::Array(items) => items.iter().filter_map(coerce_integer).collect(),
                scalar => coerce_integer(scalar).into_iter().collect(),
            };
            ids.sort_unstable();
            ids.dedup();
            AttrValue::List(ids)
        }
    }
}

struct CellInner {
    descriptor: AttrDescriptor,
    value: Observable<AttrValue>,
    on_write: Box<dyn Fn()>,
}

/// Reactive value of one attribute.
///
/// Writes are coerced by the descriptor's kind. A write that changes the
/// value runs the owner's callback so the attribute mapping re-publishes.
#[derive(Clone)]
pub struct AttributeCell {
    inner: Rc<CellInner>,
}

impl AttributeCell {
    pub fn new(descriptor: AttrDescriptor, raw: &Value, on_write: impl Fn() + 'static) -> Self {
        let value = Observable::new(coerce_attr(descriptor.kind, raw));
        Self {
            inner: Rc::new(CellInner {
                descriptor,
                value,
                on_write: Box::new(on_write),
            }),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &AttrDescriptor {
        &self.inner.descriptor
    }

    #[must_use]
    pub fn get(&self) -> AttrValue {
        self.inner.value.get()
    }

    /// Coerce and store `raw`. Returns `false`, without notifying anyone,
    /// when the coerced value equals the current one.
    pub fn write(&self, raw: &Value) -> bool {
        let next = coerce_attr(self.inner.descriptor.kind, raw);
        if self.inner.value.with(|current| *current == next) {
            return false;
        }
        self.inner.value.set(next);
        (self.inner.on_write)();
        true
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&AttrValue) + 'static) -> Subscription {
        self.inner.value.subscribe(f)
    }
}

impl fmt::Debug for AttributeCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeCell")
            .field("name", &self.inner.descriptor.name)
            .field("value", &self.inner.value.get())
            .finish()
    }
}

impl Source for AttributeCell {
    type Value = AttrValue;

    fn current(&self) -> AttrValue {
        self.get()
    }

    fn watch(&self, f: impl Fn(&AttrValue) + 'static) -> Subscription {
        self.subscribe(f)
    }
}

/// An attribute field, addressed as `attrs.<name>`.
pub type Attribute = Field<AttributeCell>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AttrRootId;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn coercion_by_kind() {
        assert_eq!(coerce_attr(AttrKind::Boolean, &json!(1)), AttrValue::Flag(true));
        assert_eq!(coerce_attr(AttrKind::Boolean, &json!("")), AttrValue::Flag(false));
        assert_eq!(coerce_attr(AttrKind::Boolean, &json!(null)), AttrValue::Flag(false));
        assert_eq!(coerce_attr(AttrKind::Text, &json!(null)), AttrValue::Text(String::new()));
        assert_eq!(coerce_attr(AttrKind::Text, &json!(12)), AttrValue::Text("12".into()));
        assert_eq!(coerce_attr(AttrKind::Numeric, &json!("8 bars")), AttrValue::Number(Some(8)));
        assert_eq!(
            coerce_attr(AttrKind::MultiSelect, &json!([3, "1", 3, "x", 2.0])),
            AttrValue::List(vec![1, 2, 3])
        );
        assert_eq!(coerce_attr(AttrKind::MultiSelect, &json!(5)), AttrValue::List(vec![5]));
        assert_eq!(coerce_attr(AttrKind::MultiSelect, &json!(null)), AttrValue::List(vec![]));
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_value(AttrValue::List(vec![1, 2])).unwrap(), json!([1, 2]));
        assert_eq!(serde_json::to_value(AttrValue::Number(None)).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(AttrValue::Flag(true)).unwrap(), json!(true));
    }

    #[test]
    fn equal_writes_are_silent() {
        let published = Rc::new(Cell::new(0));
        let published_clone = Rc::clone(&published);
        let cell = AttributeCell::new(
            AttrDescriptor::new("instrument", AttrRootId(14), AttrKind::MultiSelect),
            &json!([2, 1]),
            move || published_clone.set(published_clone.get() + 1),
        );
        let notified = Rc::new(Cell::new(0));
        let notified_clone = Rc::clone(&notified);
        let _sub = cell.subscribe(move |_| notified_clone.set(notified_clone.get() + 1));

        assert!(!cell.write(&json!([1, 2, 2])));
        assert_eq!((published.get(), notified.get()), (0, 0));

        assert!(cell.write(&json!([1])));
        assert_eq!((published.get(), notified.get()), (1, 1));
        assert_eq!(cell.get().count(), Some(1));
    }
}
