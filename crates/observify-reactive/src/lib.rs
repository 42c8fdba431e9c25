#![forbid(unsafe_code)]

//! Reactive cells for observify.
//!
//! This crate provides the change-tracking primitives the synchronization
//! engine builds on:
//!
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks, plus before-change notification
//!   and mutation bracketing for containers mutated in place.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Computed`]: A lazily-evaluated, memoized value derived from one or
//!   more dependencies, either wired explicitly or captured implicitly while
//!   the compute function runs.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification. Callbacks run after the internal borrow is released,
//! so a subscriber may read or write the observable that notified it.
//!
//! `Computed<T>` subscribes to its sources, marking itself dirty on change.
//! Recomputation is deferred until `get()` unless someone subscribed to the
//! computed value itself.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value,
//!    and exactly once per `begin_mutation`/`end_mutation` bracket.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. `Computed::get()` never returns a stale value.

pub mod computed;
pub mod observable;
pub mod tracking;

pub use computed::Computed;
pub use observable::{Observable, Subscription, WeakObservable};
