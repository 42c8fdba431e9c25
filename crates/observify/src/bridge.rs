#![forbid(unsafe_code)]

//! Routing of in-place array mutation through the owning array cell.
//!
//! An array cell marks the array it holds with a [`Bridge`]: a weak
//! back-reference to the cell. Mutating methods of a marked array open a
//! mutation bracket on the cell, apply the change to the array the cell
//! currently holds and close the bracket, so subscribers see one
//! before-change and one change notification per call. Arrays that were
//! never held by an array cell carry no marker and mutate silently.

use observify_reactive::{Observable, WeakObservable};

use crate::array::Array;
use crate::value::Value;

pub(crate) struct Bridge {
    cell: WeakObservable<Value>,
}

impl Bridge {
    pub(crate) fn is_live(&self) -> bool {
        self.cell.upgrade().is_some()
    }
}

/// Mark `value` as held by `cell`. Does nothing for non-arrays and for
/// arrays already bridged to a live cell. Returns whether a marker was
/// installed.
pub(crate) fn install(cell: &Observable<Value>, value: &Value) -> bool {
    let Value::Array(array) = value else {
        return false;
    };
    let mut inner = array.inner.borrow_mut();
    if inner.bridge.as_ref().is_some_and(Bridge::is_live) {
        return false;
    }
    inner.bridge = Some(Bridge {
        cell: cell.downgrade(),
    });
    tracing::trace!(
        message = "observify.bridge.install",
        array = array.id(),
        cell = cell.id()
    );
    true
}

fn owner(array: &Array) -> Option<Observable<Value>> {
    array
        .inner
        .borrow()
        .bridge
        .as_ref()
        .and_then(|bridge| bridge.cell.upgrade())
}

fn live(cell: &Observable<Value>, array: &Array) -> Array {
    match cell.peek() {
        Value::Array(live) => live,
        _ => array.clone(),
    }
}

/// The array a mutation of `array` lands on: the array its owning cell
/// currently holds, or `array` itself when it is not bridged.
pub(crate) fn target(array: &Array) -> Array {
    match owner(array) {
        Some(cell) => live(&cell, array),
        None => array.clone(),
    }
}

/// Run `f` against the items of `array`, bracketed by the owning cell's
/// mutation notifications when the array is bridged.
pub(crate) fn mutate<R>(array: &Array, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
    let Some(cell) = owner(array) else {
        return f(&mut array.inner.borrow_mut().items);
    };

    let live = live(&cell, array);
    cell.begin_mutation();
    let result = f(&mut live.inner.borrow_mut().items);
    cell.end_mutation();
    result
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use serde_json::json;

    fn array_of(json: serde_json::Value) -> (Value, Array) {
        let value = Value::from(json);
        let array = value.as_array().cloned().unwrap_or_default();
        (value, array)
    }

    #[test]
    fn install_marks_once() {
        let (value, array) = array_of(json!([1, 2]));
        let cell = Observable::new(value.clone());
        assert!(install(&cell, &value));
        assert!(!install(&cell, &value));
        assert!(array.is_bridged());
        assert!(!install(&cell, &Value::from(3)));
    }

    #[test]
    fn bridged_push_notifies_once() {
        let (value, array) = array_of(json!(["a"]));
        let cell = Observable::new(value.clone());
        install(&cell, &value);

        let before = Rc::new(Cell::new(0));
        let after = Rc::new(Cell::new(0));
        let b = Rc::clone(&before);
        let a = Rc::clone(&after);
        let _before_sub = cell.subscribe_before_change(move |_| b.set(b.get() + 1));
        let _after_sub = cell.subscribe(move |v| {
            assert_eq!(v.as_array().map(Array::len), Some(2));
            a.set(a.get() + 1);
        });

        array.push("b");
        assert_eq!(before.get(), 1);
        assert_eq!(after.get(), 1);
        assert_eq!(cell.version(), 1);
        assert!(cell.peek().same(&value));
    }

    #[test]
    fn dead_cell_mutates_silently() {
        let (value, array) = array_of(json!([]));
        {
            let cell = Observable::new(value.clone());
            install(&cell, &value);
        }
        assert!(!array.is_bridged());
        array.push(1);
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn stale_instance_mutates_live_array() {
        let (old_value, old) = array_of(json!([1]));
        let cell = Observable::new(old_value.clone());
        install(&cell, &old_value);

        let (new_value, live) = array_of(json!([2]));
        cell.set(new_value.clone());
        install(&cell, &new_value);

        old.push(3);
        assert_eq!(live.len(), 2);
        assert_eq!(old.len(), 1);
        assert!(target(&old).ptr_eq(&live));
    }

    #[test]
    fn unbridged_target_is_itself() {
        let (_, array) = array_of(json!([1]));
        assert!(target(&array).ptr_eq(&array));
    }
}
