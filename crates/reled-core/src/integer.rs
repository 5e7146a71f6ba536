//! Integer-or-null values with lenient coercion.

use reled_reactive::{Observable, Source, Subscription};
use serde_json::Value;

/// Coerce raw input to an integer.
///
/// Numbers truncate toward zero. Strings parse an optional sign and the
/// leading decimal digits after any leading whitespace (`" 12abc"` is 12).
/// Everything else, and anything outside `i32`, is `None`.
#[must_use]
pub fn coerce_integer(raw: &Value) -> Option<i32> {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(f64::trunc)
                .filter(|f| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(f))
                .map(|f| f as i32),
        },
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i32> {
    let trimmed = s.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    i32::try_from(if negative { -magnitude } else { magnitude }).ok()
}

/// A reactive integer-or-null; every write is coerced.
#[derive(Debug, Clone)]
pub struct Integer {
    value: Observable<Option<i32>>,
}

impl Integer {
    /// Integer holding the coerced `raw`.
    #[must_use]
    pub fn new(raw: &Value) -> Self {
        Self::from_value(coerce_integer(raw))
    }

    #[must_use]
    pub fn from_value(value: Option<i32>) -> Self {
        Self {
            value: Observable::new(value),
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<i32> {
        self.value.get()
    }

    pub fn set(&self, value: Option<i32>) {
        self.value.set(value);
    }

    /// Coerce and store `raw`.
    pub fn write(&self, raw: &Value) {
        self.set(coerce_integer(raw));
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&Option<i32>) + 'static) -> Subscription {
        self.value.subscribe(f)
    }
}

impl Source for Integer {
    type Value = Option<i32>;

    fn current(&self) -> Option<i32> {
        self.get()
    }

    fn watch(&self, f: impl Fn(&Option<i32>) + 'static) -> Subscription {
        self.subscribe(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_numbers_and_strings() {
        assert_eq!(coerce_integer(&json!(12)), Some(12));
        assert_eq!(coerce_integer(&json!(2.9)), Some(2));
        assert_eq!(coerce_integer(&json!(-2.9)), Some(-2));
        assert_eq!(coerce_integer(&json!("2020")), Some(2020));
        assert_eq!(coerce_integer(&json!("  7th")), Some(7));
        assert_eq!(coerce_integer(&json!("-04")), Some(-4));
        assert_eq!(coerce_integer(&json!("+5")), Some(5));
    }

    #[test]
    fn unparseable_input_is_null() {
        assert_eq!(coerce_integer(&json!("abc")), None);
        assert_eq!(coerce_integer(&json!("")), None);
        assert_eq!(coerce_integer(&json!("-")), None);
        assert_eq!(coerce_integer(&json!(null)), None);
        assert_eq!(coerce_integer(&json!(true)), None);
        assert_eq!(coerce_integer(&json!([1])), None);
        assert_eq!(coerce_integer(&json!(1e12)), None);
        assert_eq!(coerce_integer(&json!("99999999999")), None);
    }

    #[test]
    fn write_applies_coercion_and_gates_equal_values() {
        let int = Integer::new(&json!("3"));
        assert_eq!(int.get(), Some(3));

        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let calls_clone = std::rc::Rc::clone(&calls);
        let _sub = int.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        int.write(&json!(3.4));
        assert_eq!(calls.get(), 0);
        int.write(&json!("x"));
        assert_eq!(int.get(), None);
        assert_eq!(calls.get(), 1);
    }
}
