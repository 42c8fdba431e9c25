#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value, a version counter and two subscriber
//! lists (change and before-change) in shared, reference-counted storage.
//! Cloning an `Observable` yields another handle to the same cell.
//!
//! Containers that are mutated in place bracket the mutation with
//! [`begin_mutation`](Observable::begin_mutation) and
//! [`end_mutation`](Observable::end_mutation): before-change subscribers see
//! the value before the first bracket opens, change subscribers are notified
//! once when the outermost bracket closes.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: The panic propagates to the caller of `set()`.
//!   The value has already been stored and the version bumped; subscribers
//!   registered after the panicking one are not notified for that change.
//! - **Re-entrant `with()`**: Calling `set()` on the same observable from
//!   inside a `with()` closure panics (the value is borrowed).

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::tracking::{self, Dependency};

type Listener<T> = Rc<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    /// Bumped once per observable change.
    version: u64,
    subscribers: Vec<Weak<dyn Fn(&T)>>,
    before_change: Vec<Weak<dyn Fn(&T)>>,
    /// Open `begin_mutation` brackets.
    mutation_depth: u32,
}

#[derive(Clone, Copy)]
enum Channel {
    Change,
    BeforeChange,
}

/// A shared value cell that notifies subscribers when it changes.
///
/// # Invariants
///
/// 1. `version` increments exactly once per observable change.
/// 2. `set()` with a value equal to the current one does nothing.
/// 3. Callbacks never run while the cell is borrowed.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

/// Non-owning handle to an [`Observable`].
pub struct WeakObservable<T> {
    inner: Weak<RefCell<ObservableInner<T>>>,
}

/// RAII guard for a subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn new<G: Any>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    /// Explicitly unsubscribe. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T> WeakObservable<T> {
    /// Recover the observable if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

impl<T> Observable<T> {
    /// Identity of the underlying cell.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    /// Whether both handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning handle to this cell.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Current version. Starts at 0.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live change subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether a `begin_mutation` bracket is open.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        self.inner.borrow().mutation_depth > 0
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a new cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
                before_change: Vec::new(),
                mutation_depth: 0,
            })),
        }
    }

    /// Read the current value, recording this cell as a dependency of any
    /// computed value being evaluated.
    #[must_use]
    pub fn get(&self) -> T {
        self.track();
        self.peek()
    }

    /// Read the current value without recording a dependency.
    #[must_use]
    pub fn peek(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference, recording a dependency.
    ///
    /// # Panics
    ///
    /// Panics if the closure writes to this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.borrow().value)
    }

    /// Store `value` if it differs from the current one, notifying
    /// subscribers.
    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        if self.inner.borrow().value == value {
            return;
        }
        self.replace(value);
    }

    /// Store `value` unconditionally and notify. Returns the previous value.
    pub fn replace(&self, value: T) -> T {
        self.emit(Channel::BeforeChange);
        let previous = {
            let mut inner = self.inner.borrow_mut();
            inner.version += 1;
            std::mem::replace(&mut inner.value, value)
        };
        self.emit(Channel::Change);
        previous
    }

    /// Mutate the value in place inside a mutation bracket.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.begin_mutation();
        let result = f(&mut self.inner.borrow_mut().value);
        self.end_mutation();
        result
    }

    /// Open a mutation bracket. The outermost bracket notifies
    /// before-change subscribers.
    pub fn begin_mutation(&self) {
        let first = {
            let mut inner = self.inner.borrow_mut();
            inner.mutation_depth += 1;
            inner.mutation_depth == 1
        };
        if first {
            self.emit(Channel::BeforeChange);
        }
    }

    /// Close a mutation bracket. Closing the outermost bracket bumps the
    /// version and notifies change subscribers once.
    ///
    /// An unbalanced call is ignored.
    pub fn end_mutation(&self) {
        let last = {
            let mut inner = self.inner.borrow_mut();
            match inner.mutation_depth {
                0 => return,
                1 => {
                    inner.mutation_depth = 0;
                    inner.version += 1;
                    true
                }
                _ => {
                    inner.mutation_depth -= 1;
                    false
                }
            }
        };
        if last {
            self.emit(Channel::Change);
        }
    }

    /// Signal that the value changed without going through `set()`, e.g.
    /// after the contents of a shared container were rewritten.
    pub fn notify(&self) {
        self.inner.borrow_mut().version += 1;
        self.emit(Channel::Change);
    }

    /// Register a callback invoked with the new value after every change.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.attach(Channel::Change, Rc::new(callback))
    }

    /// Register a callback invoked with the old value before every change.
    pub fn subscribe_before_change(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.attach(Channel::BeforeChange, Rc::new(callback))
    }

    fn attach(&self, channel: Channel, listener: Listener<T>) -> Subscription {
        let weak = Rc::downgrade(&listener);
        let mut inner = self.inner.borrow_mut();
        match channel {
            Channel::Change => inner.subscribers.push(weak),
            Channel::BeforeChange => inner.before_change.push(weak),
        }
        Subscription::new(listener)
    }

    fn track(&self) {
        tracking::record(self.id(), || Rc::new(self.clone()));
    }

    fn emit(&self, channel: Channel) {
        let (listeners, value) = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let list = match channel {
                Channel::Change => &mut inner.subscribers,
                Channel::BeforeChange => &mut inner.before_change,
            };
            list.retain(|weak| weak.strong_count() > 0);
            let listeners: Vec<Listener<T>> = list.iter().filter_map(Weak::upgrade).collect();
            if listeners.is_empty() {
                return;
            }
            (listeners, inner.value.clone())
        };
        for listener in &listeners {
            listener(&value);
        }
    }
}

impl<T: Clone + 'static> Dependency for Observable<T> {
    fn dependency_id(&self) -> usize {
        self.id()
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.subscribe(move |_| on_change())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&i32) + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let handle = Rc::clone(&count);
        (count, move |_: &i32| handle.set(handle.get() + 1))
    }

    #[test]
    fn get_and_set() {
        let obs = Observable::new(1);
        assert_eq!(obs.get(), 1);
        obs.set(2);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn set_equal_value_is_noop() {
        let obs = Observable::new(5);
        let (count, cb) = counter();
        let _sub = obs.subscribe(cb);

        obs.set(5);
        assert_eq!(count.get(), 0);
        assert_eq!(obs.version(), 0);
    }

    #[test]
    fn subscribers_receive_new_value_in_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _s1 = obs.subscribe(move |v| l1.borrow_mut().push(("first", *v)));
        let l2 = Rc::clone(&log);
        let _s2 = obs.subscribe(move |v| l2.borrow_mut().push(("second", *v)));

        obs.set(7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let obs = Observable::new(0);
        let (count, cb) = counter();
        let sub = obs.subscribe(cb);
        assert_eq!(obs.subscriber_count(), 1);

        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(count.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn before_change_sees_old_value() {
        let obs = Observable::new(1);
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let _sub = obs.subscribe_before_change(move |v| seen_clone.set(*v));

        obs.set(2);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn mutation_bracket_notifies_once() {
        let obs = Observable::new(vec![1, 2]);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = obs.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        obs.begin_mutation();
        obs.begin_mutation();
        assert!(obs.is_mutating());
        obs.end_mutation();
        assert_eq!(count.get(), 0);
        obs.end_mutation();
        assert_eq!(count.get(), 1);
        assert_eq!(obs.version(), 1);
        assert!(!obs.is_mutating());
    }

    #[test]
    fn unbalanced_end_mutation_is_ignored() {
        let obs = Observable::new(0);
        obs.end_mutation();
        assert_eq!(obs.version(), 0);
    }

    #[test]
    fn update_mutates_in_place() {
        let obs = Observable::new(vec![1]);
        let len = obs.update(|v| {
            v.push(2);
            v.len()
        });
        assert_eq!(len, 2);
        assert_eq!(obs.peek(), vec![1, 2]);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn notify_fires_without_value_change() {
        let obs = Observable::new(3);
        let (count, cb) = counter();
        let _sub = obs.subscribe(cb);

        obs.notify();
        assert_eq!(count.get(), 1);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn replace_always_notifies() {
        let obs = Observable::new(3);
        let (count, cb) = counter();
        let _sub = obs.subscribe(cb);

        assert_eq!(obs.replace(3), 3);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn subscriber_may_read_and_write() {
        let obs = Observable::new(0);
        let mirror = Observable::new(0);
        let obs_clone = obs.clone();
        let mirror_clone = mirror.clone();
        let _sub = obs.subscribe(move |_| mirror_clone.set(obs_clone.get() * 10));

        obs.set(4);
        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn weak_handle_expires() {
        let obs = Observable::new(1);
        let weak = obs.downgrade();
        assert!(weak.upgrade().is_some_and(|o| o.ptr_eq(&obs)));
        drop(obs);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn clone_shares_state() {
        let a = Observable::new(1);
        let b = a.clone();
        b.set(9);
        assert_eq!(a.get(), 9);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
    }
}
