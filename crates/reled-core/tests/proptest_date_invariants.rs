#![forbid(unsafe_code)]

//! Property-based invariant tests for partial dates and integer coercion.
//!
//! 1. `render` follows the `Y` / `Y-M` / `Y-M-D` grammar.
//! 2. Feb 29 is valid exactly in Gregorian leap years.
//! 3. For fully specified dates the order check agrees with tuple ordering.
//! 4. Integer coercion reads back any printed `i32`.

use proptest::prelude::*;
use reled_core::DateParts;
use reled_core::integer::coerce_integer;
use reled_core::validate::{Violation, check_date, check_date_order, days_in_month};
use serde_json::json;

fn ymd() -> impl Strategy<Value = (i32, i32, i32)> {
    (1..4000i32, 1..=12i32, 1..=28i32)
}

proptest! {
    #[test]
    fn render_grammar((y, m, d) in ymd()) {
        prop_assert_eq!(DateParts::y(y).render(), format!("{y}"));
        prop_assert_eq!(DateParts::ym(y, m).render(), format!("{y}-{m}"));
        prop_assert_eq!(DateParts::ymd(y, m, d).render(), format!("{y}-{m}-{d}"));
        prop_assert_eq!(DateParts::new(Some(y), None, Some(d)).render(), format!("{y}"));
    }

    #[test]
    fn leap_day_matches_gregorian_rule(y in 1..10_000i32) {
        let leap = (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
        prop_assert_eq!(check_date(&DateParts::ymd(y, 2, 29)).is_ok(), leap);
        prop_assert_eq!(days_in_month(y, 2), if leap { 29 } else { 28 });
    }

    #[test]
    fn last_day_of_month_is_valid_and_next_is_not(y in 1..4000i32, m in 1..=12i32) {
        let last = days_in_month(y, m);
        prop_assert!(check_date(&DateParts::ymd(y, m, last)).is_ok());
        prop_assert_eq!(
            check_date(&DateParts::ymd(y, m, last + 1)),
            Err(Violation::InvalidDate)
        );
    }

    #[test]
    fn order_agrees_with_tuple_order(begin in ymd(), end in ymd()) {
        let verdict = check_date_order(
            &DateParts::ymd(begin.0, begin.1, begin.2),
            &DateParts::ymd(end.0, end.1, end.2),
        );
        prop_assert_eq!(verdict.is_err(), end < begin);
    }

    #[test]
    fn partial_end_never_precedes_on_missing_components((y, m, d) in ymd()) {
        let begin = DateParts::ymd(y, m, d);
        prop_assert!(check_date_order(&begin, &DateParts::y(y)).is_ok());
        prop_assert!(check_date_order(&begin, &DateParts::ym(y, m)).is_ok());
    }

    #[test]
    fn integer_coercion_reads_printed_values(n in any::<i32>()) {
        prop_assert_eq!(coerce_integer(&json!(n)), Some(n));
        prop_assert_eq!(coerce_integer(&json!(n.to_string())), Some(n));
        prop_assert_eq!(coerce_integer(&json!(format!("{n}px"))), Some(n));
    }
}
