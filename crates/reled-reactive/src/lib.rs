#![forbid(unsafe_code)]

//! Reactive value primitives for the relationship editor.
//!
//! This crate provides change-tracking primitives that the field engine in
//! `reled-core` is built on:
//!
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Computed`]: A lazily-evaluated, memoized value derived from an
//!   `Observable` dependency.
//! - [`Source`]: The push interface shared by observables and every typed
//!   field built on top of them.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification.
//!
//! Propagation is synchronous: a write re-runs every direct and transitive
//! subscriber before it returns. There is no batching.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. `set` with a value equal to the current value is a no-op (no version
//!    bump, no notifications). `force_set` and `notify` bypass this gate.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. No internal borrow is held while subscriber callbacks run.
//! 6. `Computed::get()` never returns a stale value.

pub mod computed;
pub mod observable;

pub use computed::Computed;
pub use observable::{Observable, Source, Subscription};
