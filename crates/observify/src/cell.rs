#![forbid(unsafe_code)]

//! Reactive cells backing object properties.
//!
//! [`AnyCell`] is the closed set of cells a property can be backed by: a
//! plain value cell, an array cell (which also bridges in-place mutation of
//! the array it holds) or a derived computed cell.

use std::fmt;
use std::rc::Rc;

use observify_reactive::{Computed, Observable, Subscription};

use crate::bridge;
use crate::value::{Kind, Value};

/// Observable cell holding an array. Every array instance it holds is
/// bridged, so `push` and friends on that instance notify the cell.
#[derive(Clone)]
pub struct ArrayCell {
    observable: Observable<Value>,
}

impl ArrayCell {
    #[must_use]
    pub fn new(value: Value) -> Self {
        let observable = Observable::new(value);
        bridge::install(&observable, &observable.peek());
        Self { observable }
    }

    /// Replace the held value. A new array instance is bridged before
    /// subscribers see it.
    pub fn set(&self, value: Value) {
        if self.observable.peek().same(&value) {
            return;
        }
        bridge::install(&self.observable, &value);
        self.observable.set(value);
    }

    #[must_use]
    pub fn observable(&self) -> &Observable<Value> {
        &self.observable
    }
}

/// Derived cell, writable only if it carries a write handler.
#[derive(Clone)]
pub struct ComputedCell {
    computed: Computed<Value>,
    write: Option<Rc<dyn Fn(Value)>>,
}

impl ComputedCell {
    #[must_use]
    pub fn read_only(computed: Computed<Value>) -> Self {
        Self {
            computed,
            write: None,
        }
    }

    #[must_use]
    pub fn writable(computed: Computed<Value>, write: impl Fn(Value) + 'static) -> Self {
        Self {
            computed,
            write: Some(Rc::new(write)),
        }
    }

    #[must_use]
    pub fn computed(&self) -> &Computed<Value> {
        &self.computed
    }
}

#[derive(Clone)]
pub enum AnyCell {
    Value(Observable<Value>),
    Array(ArrayCell),
    Computed(ComputedCell),
}

impl AnyCell {
    /// A value cell, or an array cell when `value` is an array.
    #[must_use]
    pub fn new(value: Value) -> Self {
        if value.kind() == Kind::Array {
            Self::Array(ArrayCell::new(value))
        } else {
            Self::Value(Observable::new(value))
        }
    }

    /// Read the value, recording a dependency.
    #[must_use]
    pub fn get(&self) -> Value {
        match self {
            Self::Value(observable) => observable.get(),
            Self::Array(cell) => cell.observable.get(),
            Self::Computed(cell) => cell.computed.get(),
        }
    }

    #[must_use]
    pub fn peek(&self) -> Value {
        match self {
            Self::Value(observable) => observable.peek(),
            Self::Array(cell) => cell.observable.peek(),
            Self::Computed(cell) => cell.computed.peek(),
        }
    }

    /// Write the value. Returns `false` for a read-only computed cell.
    pub fn try_set(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        match self {
            Self::Value(observable) => observable.set(value),
            Self::Array(cell) => cell.set(value),
            Self::Computed(cell) => match &cell.write {
                Some(write) => write(value),
                None => return false,
            },
        }
        true
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Computed(cell) => cell.write.is_some(),
            _ => true,
        }
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// The underlying observable of value and array cells.
    #[must_use]
    pub fn observable(&self) -> Option<&Observable<Value>> {
        match self {
            Self::Value(observable) => Some(observable),
            Self::Array(cell) => Some(&cell.observable),
            Self::Computed(_) => None,
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&Value) + 'static) -> Subscription {
        match self {
            Self::Value(observable) => observable.subscribe(callback),
            Self::Array(cell) => cell.observable.subscribe(callback),
            Self::Computed(cell) => cell.computed.subscribe(callback),
        }
    }

    /// Notify subscribers without changing the value, e.g. after the
    /// contents of the held composite were merged in place.
    pub fn notify(&self) {
        match self {
            Self::Value(observable) => observable.notify(),
            Self::Array(cell) => cell.observable.notify(),
            Self::Computed(cell) => cell.computed.notify(),
        }
    }

    /// Number of changes (recomputations for computed cells) so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        match self {
            Self::Value(observable) => observable.version(),
            Self::Array(cell) => cell.observable.version(),
            Self::Computed(cell) => cell.computed.version(),
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        match self {
            Self::Value(observable) => observable.id(),
            Self::Array(cell) => cell.observable.id(),
            Self::Computed(cell) => cell.computed.id(),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl PartialEq for AnyCell {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for AnyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Value(_) => "ValueCell",
            Self::Array(_) => "ArrayCell",
            Self::Computed(_) => "ComputedCell",
        };
        f.debug_tuple(name).field(&self.peek()).finish()
    }
}

impl From<Observable<Value>> for AnyCell {
    /// Arrays held by a foreign observable are not bridged.
    fn from(observable: Observable<Value>) -> Self {
        Self::Value(observable)
    }
}

impl From<Computed<Value>> for AnyCell {
    fn from(computed: Computed<Value>) -> Self {
        Self::Computed(ComputedCell::read_only(computed))
    }
}

impl From<ArrayCell> for AnyCell {
    fn from(cell: ArrayCell) -> Self {
        Self::Array(cell)
    }
}

impl From<ComputedCell> for AnyCell {
    fn from(cell: ComputedCell) -> Self {
        Self::Computed(cell)
    }
}

/// Whether `value` is a pre-built cell.
#[must_use]
pub fn is_cell(value: &Value) -> bool {
    value.kind() == Kind::Cell
}
