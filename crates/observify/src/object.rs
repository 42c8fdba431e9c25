#![forbid(unsafe_code)]

//! Objects whose properties are plain data or backed by reactive cells.
//!
//! Each property lives in a slot. A data slot stores its value directly. A
//! reactive slot routes reads and writes through its cell, and the cell
//! itself is reachable through [`Object::cell`] (the companion handle) without
//! reading the value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::cell::AnyCell;
use crate::error::{Result, SyncError};
use crate::value::Value;

#[derive(Clone)]
pub(crate) enum Slot {
    Data(Value),
    Reactive(AnyCell),
}

/// A shared, insertion-ordered map of named properties.
///
/// Cloning an `Object` creates a new handle to the **same** properties.
#[derive(Clone, Default)]
pub struct Object {
    slots: Rc<RefCell<IndexMap<String, Slot>>>,
}

impl Object {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an object of plain data properties.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let slots = entries
            .into_iter()
            .map(|(name, value)| (name.into(), Slot::Data(value.into())))
            .collect();
        Self {
            slots: Rc::new(RefCell::new(slots)),
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.slots) as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    /// Property names in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.slots.borrow().keys().cloned().collect()
    }

    /// Read a property. Reactive properties are read through their cell and
    /// become dependencies of any computed value being evaluated.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.slot(name)? {
            Slot::Data(value) => Some(value),
            Slot::Reactive(cell) => Some(cell.get()),
        }
    }

    /// Read a property without recording a dependency.
    #[must_use]
    pub fn peek(&self, name: &str) -> Option<Value> {
        match self.slot(name)? {
            Slot::Data(value) => Some(value),
            Slot::Reactive(cell) => Some(cell.peek()),
        }
    }

    /// Write a property. Reactive properties are written through their cell
    /// (notifying its subscribers); anything else becomes a data property.
    ///
    /// # Errors
    ///
    /// [`SyncError::ReadOnly`] if the property is a computed value without a
    /// write handler.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.assign(name, value.into()) {
            Ok(())
        } else {
            Err(SyncError::read_only(name))
        }
    }

    /// Like [`set`](Self::set), but reports a read-only property by returning
    /// `false` instead of failing.
    pub(crate) fn assign(&self, name: &str, value: Value) -> bool {
        match self.slot(name) {
            Some(Slot::Reactive(cell)) => cell.try_set(value),
            _ => {
                self.slots
                    .borrow_mut()
                    .insert(name.to_owned(), Slot::Data(value));
                true
            }
        }
    }

    /// Remove a property (and its companion cell), returning its value.
    pub fn remove(&self, name: &str) -> Option<Value> {
        let slot = self.slots.borrow_mut().shift_remove(name)?;
        Some(match slot {
            Slot::Data(value) => value,
            Slot::Reactive(cell) => cell.peek(),
        })
    }

    /// The cell backing a reactive property. `None` for data properties,
    /// including data properties that happen to hold a cell.
    #[must_use]
    pub fn cell(&self, name: &str) -> Option<AnyCell> {
        match self.slot(name)? {
            Slot::Reactive(cell) => Some(cell),
            Slot::Data(_) => None,
        }
    }

    #[must_use]
    pub fn is_reactive(&self, name: &str) -> bool {
        matches!(self.slot(name), Some(Slot::Reactive(_)))
    }

    /// Snapshot of all properties, read without tracking.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        let slots: Vec<(String, Slot)> = self
            .slots
            .borrow()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect();
        slots
            .into_iter()
            .map(|(name, slot)| {
                let value = match slot {
                    Slot::Data(value) => value,
                    Slot::Reactive(cell) => cell.peek(),
                };
                (name, value)
            })
            .collect()
    }

    pub(crate) fn slot(&self, name: &str) -> Option<Slot> {
        self.slots.borrow().get(name).cloned()
    }

    /// Replace the slot in place, keeping the property's position.
    pub(crate) fn install(&self, name: &str, slot: Slot) {
        self.slots.borrow_mut().insert(name.to_owned(), slot);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}
