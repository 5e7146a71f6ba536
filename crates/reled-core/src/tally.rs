//! Record-level aggregates fed by field transitions.
//!
//! Fields never touch the counters directly: each error or dirty-state
//! transition produces a [`Delta`], which the owning record's [`Tally`]
//! applies in one step before the write that caused it returns.

use std::cell::Cell;
use std::fmt;

use reled_reactive::Observable;

/// Aggregate record status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Action {
    /// No field differs from its baseline.
    #[default]
    Unchanged,
    /// A new record; dirty tracking does not apply.
    Add,
    /// At least one field differs from its baseline.
    Edit,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "",
            Self::Add => "add",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter adjustment produced by one field transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delta {
    pub errors: i32,
    pub changes: i32,
    /// A dirty comparison ran, so `action` must be recomputed even when the
    /// change count did not move.
    pub rechecked: bool,
}

impl Delta {
    pub const NONE: Self = Self {
        errors: 0,
        changes: 0,
        rechecked: false,
    };

    #[must_use]
    pub const fn errors(by: i32) -> Self {
        Self {
            errors: by,
            changes: 0,
            rechecked: false,
        }
    }

    #[must_use]
    pub const fn changes(by: i32) -> Self {
        Self {
            errors: 0,
            changes: by,
            rechecked: true,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors == 0 && self.changes == 0 && !self.rechecked
    }
}

/// Error and change counters for one record, with their reactive views.
///
/// `error_count` is the number of attached fields with a non-empty error;
/// `change_count` the number of fields diverged from their baseline.
pub struct Tally {
    errors: Cell<usize>,
    changes: Cell<usize>,
    has_errors: Observable<bool>,
    action: Observable<Action>,
}

impl Tally {
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            errors: Cell::new(0),
            changes: Cell::new(0),
            has_errors: Observable::new(false),
            action: Observable::new(action),
        }
    }

    pub fn apply(&self, delta: Delta) {
        if delta.errors != 0 {
            let errors = shift(self.errors.get(), delta.errors);
            self.errors.set(errors);
            self.has_errors.set(errors > 0);
        }
        if delta.changes != 0 {
            self.changes.set(shift(self.changes.get(), delta.changes));
        }
        if delta.rechecked && self.action.get() != Action::Add {
            self.action.set(if self.changes.get() > 0 {
                Action::Edit
            } else {
                Action::Unchanged
            });
        }
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    #[must_use]
    pub fn change_count(&self) -> usize {
        self.changes.get()
    }

    #[must_use]
    pub fn has_errors(&self) -> &Observable<bool> {
        &self.has_errors
    }

    #[must_use]
    pub fn action(&self) -> &Observable<Action> {
        &self.action
    }
}

impl fmt::Debug for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tally")
            .field("errors", &self.errors.get())
            .field("changes", &self.changes.get())
            .field("action", &self.action.get())
            .finish()
    }
}

fn shift(count: usize, by: i32) -> usize {
    let magnitude = by.unsigned_abs() as usize;
    if by >= 0 {
        count + magnitude
    } else {
        debug_assert!(count >= magnitude, "counter underflow: {count} - {magnitude}");
        count.saturating_sub(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_deltas_drive_has_errors() {
        let tally = Tally::new(Action::Unchanged);
        tally.apply(Delta::errors(1));
        tally.apply(Delta::errors(1));
        assert_eq!(tally.error_count(), 2);
        assert!(tally.has_errors().get());

        tally.apply(Delta::errors(-1));
        assert!(tally.has_errors().get());
        tally.apply(Delta::errors(-1));
        assert!(!tally.has_errors().get());
    }

    #[test]
    fn change_deltas_drive_action() {
        let tally = Tally::new(Action::Unchanged);
        tally.apply(Delta::changes(1));
        assert_eq!(tally.action().get(), Action::Edit);
        tally.apply(Delta::changes(0));
        assert_eq!(tally.action().get(), Action::Edit);
        tally.apply(Delta::changes(-1));
        assert_eq!(tally.action().get(), Action::Unchanged);
    }

    #[test]
    fn add_is_sticky() {
        let tally = Tally::new(Action::Add);
        tally.apply(Delta::changes(1));
        assert_eq!(tally.action().get(), Action::Add);
    }

    #[test]
    fn empty_delta_is_noop() {
        assert!(Delta::NONE.is_empty());
        assert!(!Delta::changes(0).is_empty());
        let tally = Tally::new(Action::Unchanged);
        tally.apply(Delta::NONE);
        assert_eq!(tally.error_count(), 0);
        assert_eq!(tally.action().version(), 0);
    }

    #[test]
    fn action_strings() {
        assert_eq!(Action::Unchanged.to_string(), "");
        assert_eq!(Action::Add.as_str(), "add");
        assert_eq!(Action::Edit.as_str(), "edit");
    }
}
