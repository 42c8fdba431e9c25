#![forbid(unsafe_code)]

//! Shared arrays with observable in-place mutation.
//!
//! An [`Array`] is a plain sequence of values with reference identity. Its
//! mutating methods (`push`, `pop`, `shift`, `unshift`, `reverse`,
//! `sort_by`, `splice` and the convenience helpers built on them) go through
//! the array's bridge when it carries one, see [`crate::bridge`]. Index
//! assignment with [`Array::set`] is never bridged.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::bridge::{self, Bridge};
use crate::value::Value;

#[derive(Default)]
pub(crate) struct ArrayInner {
    pub(crate) items: Vec<Value>,
    /// Set once the array becomes the value of an array cell.
    pub(crate) bridge: Option<Bridge>,
}

/// A shared, ordered sequence of values.
///
/// Cloning an `Array` creates a new handle to the **same** sequence.
#[derive(Clone, Default)]
pub struct Array {
    pub(crate) inner: Rc<RefCell<ArrayInner>>,
}

impl Array {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ArrayInner {
                items,
                bridge: None,
            })),
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.borrow().items.get(index).cloned()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.borrow().items.clone()
    }

    /// Whether mutations of this instance notify an array cell.
    #[must_use]
    pub fn is_bridged(&self) -> bool {
        self.inner
            .borrow()
            .bridge
            .as_ref()
            .is_some_and(Bridge::is_live)
    }

    /// Assign an index directly, without notifying. Writing past the end
    /// pads with `Undefined`.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut inner = self.inner.borrow_mut();
        if index >= inner.items.len() {
            inner.items.resize(index + 1, Value::Undefined);
        }
        inner.items[index] = value.into();
    }

    /// Append a value. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        let value = value.into();
        bridge::mutate(self, |items| {
            items.push(value);
            items.len()
        })
    }

    pub fn pop(&self) -> Option<Value> {
        bridge::mutate(self, Vec::pop)
    }

    /// Remove and return the first value.
    pub fn shift(&self) -> Option<Value> {
        bridge::mutate(self, |items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
    }

    /// Prepend values, keeping their order. Returns the new length.
    pub fn unshift(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let values: Vec<Value> = values.into_iter().collect();
        bridge::mutate(self, |items| {
            items.splice(0..0, values);
            items.len()
        })
    }

    pub fn reverse(&self) {
        bridge::mutate(self, |items| items.reverse());
    }

    /// Stable in-place sort.
    pub fn sort_by(&self, compare: impl FnMut(&Value, &Value) -> Ordering) {
        bridge::mutate(self, |items| items.sort_by(compare));
    }

    /// Remove `delete_count` values starting at `start` and insert `insert`
    /// in their place. Out-of-range bounds are clamped. Returns the removed
    /// values.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        insert: impl IntoIterator<Item = Value>,
    ) -> Vec<Value> {
        let insert: Vec<Value> = insert.into_iter().collect();
        bridge::mutate(self, |items| {
            let start = start.min(items.len());
            let end = start.saturating_add(delete_count).min(items.len());
            items.splice(start..end, insert).collect()
        })
    }

    /// Remove every value identical to `value`. Returns the removed values;
    /// nothing is notified when there is no match.
    pub fn remove(&self, value: &Value) -> Vec<Value> {
        self.remove_where(|item| item.same(value))
    }

    /// Remove every value matching `predicate`.
    pub fn remove_where(&self, mut predicate: impl FnMut(&Value) -> bool) -> Vec<Value> {
        if !bridge::target(self).to_vec().iter().any(&mut predicate) {
            return Vec::new();
        }
        bridge::mutate(self, |items| {
            let mut removed = Vec::new();
            items.retain(|item| {
                if predicate(item) {
                    removed.push(item.clone());
                    false
                } else {
                    true
                }
            });
            removed
        })
    }

    /// Empty the array. Returns the removed values.
    pub fn remove_all(&self) -> Vec<Value> {
        if bridge::target(self).is_empty() {
            return Vec::new();
        }
        bridge::mutate(self, std::mem::take)
    }

    pub fn clear(&self) {
        self.remove_all();
    }

    /// Replace the first value identical to `old`. Returns whether a value
    /// was replaced.
    pub fn replace(&self, old: &Value, new: impl Into<Value>) -> bool {
        if bridge::target(self).position(old).is_none() {
            return false;
        }
        let new = new.into();
        bridge::mutate(self, |items| {
            match items.iter().position(|item| item.same(old)) {
                Some(index) => {
                    items[index] = new;
                    true
                }
                None => false,
            }
        })
    }

    /// Remove `value` if present, append it otherwise. Returns `true` if the
    /// value is present afterwards.
    pub fn toggle(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if bridge::target(self).position(&value).is_some() {
            self.remove(&value);
            false
        } else {
            self.push(value);
            true
        }
    }

    fn position(&self, value: &Value) -> Option<usize> {
        self.inner
            .borrow()
            .items
            .iter()
            .position(|item| item.same(value))
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(array: &Array) -> serde_json::Value {
        Value::Array(array.clone()).to_json()
    }

    fn names(values: &[&str]) -> Array {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn unbridged_mutations() {
        let array = names(&["b", "a"]);
        assert!(!array.is_bridged());
        assert_eq!(array.push("c"), 3);
        array.sort_by(|x, y| x.as_str().cmp(&y.as_str()));
        assert_eq!(strings(&array), json!(["a", "b", "c"]));
        array.reverse();
        assert_eq!(array.shift().and_then(|v| v.as_str().map(str::to_owned)), Some("c".into()));
        assert_eq!(array.unshift([Value::from("x"), Value::from("y")]), 4);
        assert_eq!(strings(&array), json!(["x", "y", "b", "a"]));
        assert!(array.pop().is_some());
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn splice_clamps_bounds() {
        let array = names(&["a", "b", "c"]);
        let removed = array.splice(1, 10, [Value::from("z")]);
        assert_eq!(removed.len(), 2);
        assert_eq!(strings(&array), json!(["a", "z"]));

        let removed = array.splice(99, 1, [Value::from("end")]);
        assert!(removed.is_empty());
        assert_eq!(strings(&array), json!(["a", "z", "end"]));
    }

    #[test]
    fn set_pads_with_undefined() {
        let array = Array::new();
        array.set(2, "x");
        assert_eq!(array.len(), 3);
        assert!(array.get(0).is_some_and(|v| v.is_undefined()));
    }

    #[test]
    fn remove_replace_toggle() {
        let array = names(&["Bob", "Jill", "Jane", "Bob"]);
        assert_eq!(array.remove(&Value::from("Bob")).len(), 2);
        assert!(array.replace(&Value::from("Jane"), "Anne"));
        assert!(!array.replace(&Value::from("Nobody"), "x"));
        assert_eq!(strings(&array), json!(["Jill", "Anne"]));

        assert!(!array.toggle("Jill"));
        assert!(array.toggle("Jill"));
        assert_eq!(strings(&array), json!(["Anne", "Jill"]));

        assert_eq!(array.remove_all().len(), 2);
        assert!(array.is_empty());
    }
}
