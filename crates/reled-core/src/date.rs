//! Partial dates: year, month and day, each optional and separately reactive.
//!
//! [`PartialDate`] keeps one [`Integer`] per component plus a composite
//! [`Observable<DateParts>`]. Any component change is pushed into the
//! composite, so subscribers of the date hear about edits made through the
//! components. [`PartialDate::set`] writes all three components and emits a
//! single composite notification.

use std::cell::Cell;
use std::rc::Rc;

use reled_reactive::{Observable, Source, Subscription};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::integer::{Integer, coerce_integer};

/// Snapshot of a partial date's components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateParts {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
}

impl DateParts {
    #[must_use]
    pub const fn new(year: Option<i32>, month: Option<i32>, day: Option<i32>) -> Self {
        Self { year, month, day }
    }

    #[must_use]
    pub const fn ymd(year: i32, month: i32, day: i32) -> Self {
        Self::new(Some(year), Some(month), Some(day))
    }

    #[must_use]
    pub const fn ym(year: i32, month: i32) -> Self {
        Self::new(Some(year), Some(month), None)
    }

    #[must_use]
    pub const fn y(year: i32) -> Self {
        Self::new(Some(year), None, None)
    }

    /// Coerce an object `{year, month, day}`; other input is an empty date.
    #[must_use]
    pub fn from_json(raw: &Value) -> Self {
        let part = |key: &str| raw.get(key).and_then(coerce_integer);
        Self::new(part("year"), part("month"), part("day"))
    }

    /// All components absent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }

    /// Canonical partial form: `"Y"`, `"Y-M"`, `"Y-M-D"`, or `""`.
    ///
    /// A missing (or zero) component truncates everything after it.
    #[must_use]
    pub fn render(&self) -> String {
        let present = |c: Option<i32>| c.filter(|v| *v != 0);
        let Some(year) = present(self.year) else {
            return String::new();
        };
        let Some(month) = present(self.month) else {
            return year.to_string();
        };
        match present(self.day) {
            Some(day) => format!("{year}-{month}-{day}"),
            None => format!("{year}-{month}"),
        }
    }
}

struct DateInner {
    year: Integer,
    month: Integer,
    day: Integer,
    composite: Observable<DateParts>,
    muted: Rc<Cell<bool>>,
    _components: [Subscription; 3],
}

/// A reactive partial date.
///
/// Cloning creates a new handle to the same date.
#[derive(Clone)]
pub struct PartialDate {
    inner: Rc<DateInner>,
}

impl std::fmt::Debug for PartialDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PartialDate").field(&self.get()).finish()
    }
}

impl PartialDate {
    #[must_use]
    pub fn new(parts: DateParts) -> Self {
        let year = Integer::from_value(parts.year);
        let month = Integer::from_value(parts.month);
        let day = Integer::from_value(parts.day);
        let composite = Observable::new(parts);
        let muted = Rc::new(Cell::new(false));

        let push = |component: &Integer| {
            let (year, month, day) = (year.clone(), month.clone(), day.clone());
            let composite = composite.clone();
            let muted = Rc::clone(&muted);
            component.subscribe(move |_| {
                if !muted.get() {
                    composite.set(DateParts::new(year.get(), month.get(), day.get()));
                }
            })
        };
        let components = [push(&year), push(&month), push(&day)];

        Self {
            inner: Rc::new(DateInner {
                year,
                month,
                day,
                composite,
                muted,
                _components: components,
            }),
        }
    }

    /// Date from a raw `{year, month, day}` object.
    #[must_use]
    pub fn from_json(raw: &Value) -> Self {
        Self::new(DateParts::from_json(raw))
    }

    #[must_use]
    pub fn year(&self) -> &Integer {
        &self.inner.year
    }

    #[must_use]
    pub fn month(&self) -> &Integer {
        &self.inner.month
    }

    #[must_use]
    pub fn day(&self) -> &Integer {
        &self.inner.day
    }

    #[must_use]
    pub fn get(&self) -> DateParts {
        self.inner.composite.get()
    }

    /// Write every component, notifying date subscribers at most once.
    pub fn set(&self, parts: DateParts) {
        let inner = &self.inner;
        inner.muted.set(true);
        inner.year.set(parts.year);
        inner.month.set(parts.month);
        inner.day.set(parts.day);
        inner.muted.set(false);
        inner.composite.set(parts);
    }

    /// Coerce and write a raw `{year, month, day}` object.
    pub fn write(&self, raw: &Value) {
        self.set(DateParts::from_json(raw));
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.get().render()
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&DateParts) + 'static) -> Subscription {
        self.inner.composite.subscribe(f)
    }
}

impl Source for PartialDate {
    type Value = DateParts;

    fn current(&self) -> DateParts {
        self.get()
    }

    fn watch(&self, f: impl Fn(&DateParts) + 'static) -> Subscription {
        self.subscribe(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn render_grammar() {
        assert_eq!(DateParts::y(1999).render(), "1999");
        assert_eq!(DateParts::ym(1999, 4).render(), "1999-4");
        assert_eq!(DateParts::ymd(1999, 4, 30).render(), "1999-4-30");
        assert_eq!(DateParts::default().render(), "");
    }

    #[test]
    fn render_truncates_after_missing_component() {
        assert_eq!(DateParts::new(Some(2001), None, Some(5)).render(), "2001");
        assert_eq!(DateParts::new(None, Some(3), Some(5)).render(), "");
        assert_eq!(DateParts::new(Some(2001), Some(0), Some(5)).render(), "2001");
    }

    #[test]
    fn component_writes_propagate_to_date() {
        let date = PartialDate::new(DateParts::y(2000));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = date.subscribe(move |p| seen_clone.borrow_mut().push(*p));

        date.month().write(&json!("6"));
        date.day().set(Some(15));

        assert_eq!(
            *seen.borrow(),
            vec![DateParts::ym(2000, 6), DateParts::ymd(2000, 6, 15)]
        );
        assert_eq!(date.render(), "2000-6-15");
    }

    #[test]
    fn whole_date_write_notifies_once() {
        let date = PartialDate::new(DateParts::default());
        let calls = Rc::new(Cell::new(0));
        let calls_clone = Rc::clone(&calls);
        let _sub = date.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        date.set(DateParts::ymd(2010, 1, 2));
        assert_eq!(calls.get(), 1);
        assert_eq!(date.year().get(), Some(2010));

        date.set(DateParts::ymd(2010, 1, 2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn from_json_coerces_components() {
        let parts = DateParts::from_json(&json!({"year": "1984", "month": 2.0, "day": null}));
        assert_eq!(parts, DateParts::ym(1984, 2));
        assert!(DateParts::from_json(&json!("1984")).is_empty());
    }

    #[test]
    fn serializes_as_object_with_nulls() {
        assert_eq!(
            serde_json::to_value(DateParts::y(5)).unwrap(),
            json!({"year": 5, "month": null, "day": null})
        );
    }
}
