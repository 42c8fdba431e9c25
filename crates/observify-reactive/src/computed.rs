#![forbid(unsafe_code)]

//! Lazy computed values that auto-update from their dependencies.
//!
//! # Design
//!
//! [`Computed<T>`] wraps a compute function and its cached result in shared,
//! reference-counted storage. When any dependency changes, the cached value is
//! invalidated (marked dirty). The next call to [`get()`](Computed::get)
//! recomputes and caches the result.
//!
//! Dependencies are either wired explicitly ([`from_observable`],
//! [`from2`], [`from_fn`]) or captured on every recomputation
//! ([`tracked`]): whatever the compute function reads through `get()` becomes
//! the new dependency set, replacing the previous one.
//!
//! A computed value with subscribers of its own is evaluated eagerly: when a
//! dependency changes it recomputes immediately and hands the new value to
//! its subscribers.
//!
//! # Invariants
//!
//! 1. `get()` always returns a value consistent with the current state of all
//!    dependencies (no stale reads after a dependency mutation completes).
//! 2. The compute function is called at most once per dependency change cycle
//!    (memoization).
//! 3. If no dependency has changed, `get()` returns the cached value in O(1).
//! 4. Version increments by exactly 1 per recomputation.
//!
//! # Failure Modes
//!
//! - **Compute function panics**: The cached value remains from the last
//!   successful computation. The dirty flag stays set so the next `get()` will
//!   retry.
//! - **Dependency dropped**: If a source `Observable` is dropped, the
//!   subscription becomes inert. The computed value retains its last cached
//!   result and never becomes dirty again from that source.
//! - **Self-dependency**: A compute function that reads its own computed
//!   value panics on the re-entrant borrow.
//!
//! [`from_observable`]: Computed::from_observable
//! [`from2`]: Computed::from2
//! [`from_fn`]: Computed::from_fn
//! [`tracked`]: Computed::tracked

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::observable::{Observable, Subscription};
use crate::tracking::{self, Dependency};

/// Shared interior for [`Computed<T>`].
struct ComputedInner<T> {
    /// The computation function.
    compute: Rc<dyn Fn() -> T>,
    /// Cached result (None only before first computation).
    cached: Option<T>,
    /// Whether the cached value is stale.
    dirty: Cell<bool>,
    /// Monotonically increasing version, bumped on each recomputation.
    version: u64,
    /// Re-capture dependencies on every recomputation.
    tracked: bool,
    /// Guards keeping dependency callbacks alive.
    sources: Vec<Subscription>,
    /// Subscribers to this computed value.
    listeners: Vec<Weak<dyn Fn(&T)>>,
}

/// A lazily-evaluated, memoized value derived from one or more dependencies.
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

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("dirty", &inner.dirty.get())
            .field("version", &inner.version)
            .finish()
    }
}

impl<T> Computed<T> {
    /// Identity of the underlying state.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    /// Whether both handles refer to the same computed value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the cached value is stale.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty.get()
    }

    /// Force invalidation of the cached value. The next `get()` will
    /// recompute.
    pub fn invalidate(&self) {
        self.inner.borrow().dirty.set(true);
    }

    /// Current version number. Increments by 1 on each recomputation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of dependencies currently watched.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.borrow().sources.len()
    }
}

impl<T: Clone + 'static> Computed<T> {
    fn with_compute(compute: Rc<dyn Fn() -> T>, tracked: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                compute,
                cached: None,
                dirty: Cell::new(true), // Dirty initially; computes on first get().
                version: 0,
                tracked,
                sources: Vec::new(),
                listeners: Vec::new(),
            })),
        }
    }

    /// Callback that marks this value dirty and wakes its subscribers.
    /// Holds only a weak reference so sources never keep it alive.
    fn invalidator(&self) -> Rc<dyn Fn()> {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                Computed { inner }.invalidate_and_notify();
            }
        })
    }

    fn watch_source(&self, source: &dyn Dependency) {
        let sub = source.watch(self.invalidator());
        self.inner.borrow_mut().sources.push(sub);
    }

    /// Create a computed value derived from a single observable.
    ///
    /// The `map` function receives a reference to the source value and
    /// returns the derived value.
    pub fn from_observable<S: Clone + 'static>(
        source: &Observable<S>,
        map: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let source_clone = source.clone();
        let computed = Self::with_compute(Rc::new(move || source_clone.with(|v| map(v))), false);
        computed.watch_source(source);
        computed
    }

    /// Create a computed value derived from two observables.
    pub fn from2<S1, S2>(
        s1: &Observable<S1>,
        s2: &Observable<S2>,
        map: impl Fn(&S1, &S2) -> T + 'static,
    ) -> Self
    where
        S1: Clone + 'static,
        S2: Clone + 'static,
    {
        let s1_clone = s1.clone();
        let s2_clone = s2.clone();
        let computed = Self::with_compute(
            Rc::new(move || s1_clone.with(|v1| s2_clone.with(|v2| map(v1, v2)))),
            false,
        );
        computed.watch_source(s1);
        computed.watch_source(s2);
        computed
    }

    /// Create a computed value from a standalone compute function and
    /// pre-built subscriptions.
    ///
    /// This is the low-level constructor for advanced use cases where
    /// the caller manages dependency subscriptions manually.
    pub fn from_fn(compute: impl Fn() -> T + 'static, subscriptions: Vec<Subscription>) -> Self {
        let computed = Self::with_compute(Rc::new(compute), false);
        computed.inner.borrow_mut().sources = subscriptions;
        computed
    }

    /// Create a computed value whose dependencies are whatever `compute`
    /// reads through `get()`, re-captured on every recomputation.
    pub fn tracked(compute: impl Fn() -> T + 'static) -> Self {
        Self::with_compute(Rc::new(compute), true)
    }

    fn refresh(&self) {
        let (compute, tracked) = {
            let inner = self.inner.borrow();
            if !inner.dirty.get() && inner.cached.is_some() {
                return;
            }
            (Rc::clone(&inner.compute), inner.tracked)
        };

        // Explicit sources are not captured, but the frame still keeps the
        // reads away from any enclosing computed.
        let (value, deps) = tracking::capture(|| compute());
        let sources: Option<Vec<Subscription>> = tracked.then(|| {
            deps.iter()
                .filter(|dep| dep.dependency_id() != self.id())
                .map(|dep| dep.watch(self.invalidator()))
                .collect()
        });

        let mut inner = self.inner.borrow_mut();
        inner.cached = Some(value);
        inner.dirty.set(false);
        inner.version += 1;
        if let Some(sources) = sources {
            inner.sources = sources;
        }
        tracing::trace!(
            message = "reactive.computed.recompute",
            version = inner.version,
            dependencies = inner.sources.len()
        );
    }

    /// Get the current value, recomputing if any dependency has changed.
    ///
    /// Returns a clone of the cached value. If the value is dirty, the
    /// compute function is called first and the result is cached.
    #[must_use]
    pub fn get(&self) -> T {
        tracking::record(self.id(), || Rc::new(self.clone()));
        self.peek()
    }

    /// Like [`get()`](Self::get) but without recording a dependency.
    #[must_use]
    pub fn peek(&self) -> T {
        self.refresh();
        self.inner
            .borrow()
            .cached
            .as_ref()
            .expect("cached is always Some after refresh")
            .clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// Forces recomputation if dirty. The closure receives an immutable
    /// reference to the cached value.
    ///
    /// # Panics
    ///
    /// Panics if the closure attempts to call `get()` on the same
    /// `Computed` while it is dirty (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        tracking::record(self.id(), || Rc::new(self.clone()));
        self.refresh();
        let inner = self.inner.borrow();
        f(inner
            .cached
            .as_ref()
            .expect("cached is always Some after refresh"))
    }

    /// Register a callback invoked with the recomputed value whenever a
    /// dependency changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        // Dependencies of a tracked computed are only known after a first run.
        self.refresh();
        let listener: Rc<dyn Fn(&T)> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&listener));
        Subscription::new(listener)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Invalidate and hand the recomputed value to subscribers, as if a
    /// dependency had changed.
    pub fn notify(&self) {
        self.invalidate_and_notify();
    }

    fn invalidate_and_notify(&self) {
        let listeners: Vec<Rc<dyn Fn(&T)>> = {
            let inner = self.inner.borrow();
            inner.dirty.set(true);
            inner.listeners.iter().filter_map(Weak::upgrade).collect()
        };
        if listeners.is_empty() {
            return;
        }
        let value = tracking::untracked(|| self.peek());
        for listener in &listeners {
            listener(&value);
        }
    }
}

impl<T: Clone + 'static> Dependency for Computed<T> {
    fn dependency_id(&self) -> usize {
        self.id()
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.subscribe(move |_| on_change())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
