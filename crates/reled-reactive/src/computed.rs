#![forbid(unsafe_code)]

//! Lazy derived values that track an [`Observable`] dependency.
//!
//! # Design
//!
//! [`Computed<T>`] wraps a derivation and its cached result in shared,
//! reference-counted storage. A change to the source marks the cache dirty;
//! the next [`get()`](Computed::get) re-runs the derivation.
//!
//! A `Computed` has no subscribers of its own. Code that needs to *push* a
//! derived value (and suppress pushes when the derived value did not move)
//! pairs it with an equality-gated [`Observable`], see [`Computed::feed`].
//!
//! # Invariants
//!
//! 1. `get()` is consistent with the current source value.
//! 2. The derivation runs at most once per source change.
//! 3. `version()` increments by exactly 1 per recomputation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::observable::{Observable, Subscription};

struct ComputedInner<T> {
    derive: Box<dyn Fn() -> T>,
    cached: Option<T>,
    dirty: Cell<bool>,
    version: u64,
    _source: Option<Subscription>,
}

impl<T> ComputedInner<T> {
    fn refresh(&mut self) {
        if self.dirty.get() || self.cached.is_none() {
            self.cached = Some((self.derive)());
            self.dirty.set(false);
            self.version += 1;
        }
    }
}

/// A lazily-evaluated, memoized value derived from an [`Observable`].
///
/// Cloning a `Computed` creates a new handle to the **same** inner state.
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("dirty", &inner.dirty.get())
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Derive a value from `source` through `map`.
    pub fn from_observable<S: Clone + PartialEq + 'static>(
        source: &Observable<S>,
        map: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let reader = source.clone();
        let inner = Rc::new(RefCell::new(ComputedInner {
            derive: Box::new(move || reader.with(|v| map(v))),
            cached: None,
            dirty: Cell::new(true),
            version: 0,
            _source: None,
        }));

        let weak = Rc::downgrade(&inner);
        let sub = source.subscribe(move |_| {
            if let Some(strong) = weak.upgrade() {
                strong.borrow().dirty.set(true);
            }
        });
        inner.borrow_mut()._source = Some(sub);

        Self { inner }
    }

    /// Current value, recomputed first if the source changed.
    #[must_use]
    pub fn get(&self) -> T {
        let mut inner = self.inner.borrow_mut();
        inner.refresh();
        match &inner.cached {
            Some(value) => value.clone(),
            None => (inner.derive)(),
        }
    }

    /// Whether the cached value is stale.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty.get()
    }

    /// Force the next `get()` to recompute.
    pub fn invalidate(&self) {
        self.inner.borrow().dirty.set(true);
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Push the derived value into `target` every time `trigger` changes.
    ///
    /// `target` is equality-gated, so its subscribers only hear about
    /// recomputations that produced a different value.
    pub fn feed<S: Clone + PartialEq + 'static>(
        &self,
        trigger: &Observable<S>,
        target: &Observable<T>,
    ) -> Subscription {
        let computed = self.clone();
        let target = target.clone();
        target.set(computed.get());
        trigger.subscribe(move |_| target.set(computed.get()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
