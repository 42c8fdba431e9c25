#![forbid(unsafe_code)]

//! Recursive merge of incoming data into a reactive model.
//!
//! # Algorithm
//!
//! Every step dispatches once on the [`Kind`] of both sides:
//!
//! - **object into object**: each own property of the incoming object is
//!   either assigned directly (pre-built cells) or handed to the reifier,
//!   which creates the backing cell on first sight and merges into the
//!   cell's current value afterwards.
//! - **array into array**: if the parent property is configured for keyed
//!   matching, the incoming items are first reordered by
//!   [`reconcile`](crate::reconcile()). Items are then merged position by
//!   position: composites of the same kind recurse, anything else that
//!   differs by identity overwrites the slot with a reified copy. A longer
//!   model array keeps its tail.
//!
//! Merging the model into itself reifies whatever is still plain and
//! otherwise changes nothing.
//!
//! # Failure Modes
//!
//! - **Cyclic trees**: there is no cycle detection. Merging a tree that
//!   contains itself recurses until the stack overflows.

use crate::array::Array;
use crate::error::{Result, SyncError};
use crate::object::Object;
use crate::options::SyncOptions;
use crate::value::{Kind, Value};

pub(crate) struct Synchronizer<'a> {
    pub(crate) options: &'a SyncOptions,
}

impl<'a> Synchronizer<'a> {
    pub(crate) fn new(options: &'a SyncOptions) -> Self {
        Self { options }
    }

    /// Merge `incoming` into `model` when both are composites of the same
    /// kind. Returns whether the slots of an array were rewritten.
    pub(crate) fn merge(&self, model: &Value, incoming: &Value, parent: Option<&str>) -> bool {
        match (model, incoming) {
            (Value::Object(model), Value::Object(incoming)) => {
                self.merge_object(model, incoming);
                false
            }
            (Value::Array(model), Value::Array(incoming)) => {
                self.merge_array(model, incoming, parent)
            }
            _ => false,
        }
    }

    fn merge_object(&self, model: &Object, incoming: &Object) {
        for (name, value) in incoming.entries() {
            if value.kind() == Kind::Cell {
                if !model.assign(&name, value) {
                    tracing::trace!(message = "observify.skip_read_only", property = %name);
                }
            } else {
                self.reify(model, &name, &value);
            }
        }
    }

    fn merge_array(&self, model: &Array, incoming: &Array, parent: Option<&str>) -> bool {
        let key = parent.and_then(|name| self.options.key_for(name));
        let source = match key {
            Some(key) if !model.ptr_eq(incoming) => {
                crate::reconcile::reconcile(&model.to_vec(), &incoming.to_vec(), key)
            }
            _ => incoming.to_vec(),
        };

        let mut changed = false;
        for (index, item) in source.iter().enumerate() {
            match model.get(index) {
                Some(current)
                    if current.is_composite()
                        && item.is_composite()
                        && current.kind() == item.kind() =>
                {
                    // Nested arrays have no parent name, so they are never reconciled.
                    changed |= self.merge(&current, item, None);
                }
                Some(current) if current.same(item) => {}
                _ => {
                    model.set(index, self.instantiate(item));
                    changed = true;
                }
            }
        }
        changed
    }

    /// A reified copy of `value`. Scalars and cells are returned as is.
    pub(crate) fn instantiate(&self, value: &Value) -> Value {
        match value {
            Value::Object(object) => {
                let fresh = Object::new();
                self.merge_object(&fresh, object);
                Value::Object(fresh)
            }
            Value::Array(array) => {
                let fresh = Array::new();
                self.merge_array(&fresh, array, None);
                Value::Array(fresh)
            }
            _ => value.clone(),
        }
    }
}

/// Merge `incoming` into `model` and return the model.
///
/// A non-composite `incoming` is returned unchanged and the model is left
/// alone. Passing the same tree on both sides reifies it in place, see
/// [`observe`].
///
/// # Errors
///
/// - [`SyncError::InvalidArgument`] if `model` is not an object or array.
/// - [`SyncError::ShapeMismatch`] if one side is an object and the other an
///   array.
///
/// # Example
///
/// ```
/// use observify::{synchronize, SyncOptions, Value};
/// use serde_json::json;
///
/// let options = SyncOptions::new();
/// let model = Value::from(json!({ "name": "Bob" }));
/// synchronize(&model, &model, &options)?;
///
/// let object = model.as_object().unwrap();
/// let cell = object.cell("name").unwrap();
///
/// synchronize(&model, &Value::from(json!({ "name": "Jill" })), &options)?;
/// assert_eq!(cell.peek().as_str(), Some("Jill"));
/// assert!(object.cell("name").unwrap().ptr_eq(&cell));
/// # Ok::<(), observify::SyncError>(())
/// ```
pub fn synchronize(model: &Value, incoming: &Value, options: &SyncOptions) -> Result<Value> {
    if !incoming.is_composite() {
        return Ok(incoming.clone());
    }
    if !model.is_composite() {
        return Err(SyncError::invalid(format!(
            "cannot synchronize into a {}",
            model.kind_name()
        )));
    }
    if model.kind() != incoming.kind() {
        return Err(SyncError::ShapeMismatch {
            model: model.kind_name(),
            incoming: incoming.kind_name(),
        });
    }

    let _span = tracing::debug_span!(
        "observify.synchronize",
        kind = model.kind_name(),
        deep = options.deep,
        reconciled = options.array_keys.len()
    )
    .entered();
    Synchronizer::new(options).merge(model, incoming, None);
    Ok(model.clone())
}

/// Reify `model` in place: `synchronize(model, model, options)`.
///
/// # Errors
///
/// [`SyncError::InvalidArgument`] if `model` is not an object or array.
pub fn observe(model: &Value, options: &SyncOptions) -> Result<Value> {
    if !model.is_composite() {
        return Err(SyncError::invalid(format!(
            "cannot observe a {}",
            model.kind_name()
        )));
    }
    synchronize(model, model, options)
}

/// A new reactive model populated from `defaults`, which is left untouched.
/// Non-composite defaults are returned unchanged.
///
/// # Errors
///
/// Never fails for composite defaults; the `Result` mirrors [`synchronize`].
pub fn create_reactive_model(defaults: &Value, options: &SyncOptions) -> Result<Value> {
    match defaults.empty_like() {
        Some(model) => synchronize(&model, defaults, options),
        None => Ok(defaults.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn scalar_incoming_is_returned_unchanged() {
        let target = model(json!({ "a": 1 }));
        let result = synchronize(&target, &Value::from(5), &SyncOptions::new());
        assert_eq!(result.ok().and_then(|v| v.as_i64()), Some(5));
        assert!(target.as_object().is_some_and(|o| !o.is_reactive("a")));
    }

    #[test]
    fn scalar_model_is_invalid() {
        let err = synchronize(&Value::from(1), &model(json!({})), &SyncOptions::new());
        assert!(matches!(err, Err(SyncError::InvalidArgument { .. })));
        assert!(matches!(
            observe(&Value::Null, &SyncOptions::new()),
            Err(SyncError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn top_level_shape_mismatch() {
        let err = synchronize(&model(json!({})), &model(json!([])), &SyncOptions::new());
        assert_eq!(
            err.err(),
            Some(SyncError::ShapeMismatch {
                model: "object",
                incoming: "array"
            })
        );
    }

    #[test]
    fn returns_the_model_itself() {
        let target = model(json!({}));
        let result = synchronize(&target, &model(json!({ "x": 1 })), &SyncOptions::new());
        assert!(result.is_ok_and(|v| v.same(&target)));
    }

    #[test]
    fn nested_array_item_of_other_kind_is_replaced() {
        let target = model(json!([[1, 2], { "a": 1 }]));
        observe(&target, &SyncOptions::new()).ok();
        synchronize(&target, &model(json!([{ "b": 2 }, [3]])), &SyncOptions::new()).ok();
        assert_eq!(target.to_json(), json!([{ "b": 2 }, [3]]));
    }

    #[test]
    fn longer_model_array_keeps_tail() {
        let target = model(json!([1, 2, 3]));
        synchronize(&target, &model(json!([9])), &SyncOptions::new()).ok();
        assert_eq!(target.to_json(), json!([9, 2, 3]));
    }

    #[test]
    fn create_reactive_model_leaves_defaults_alone() {
        let defaults = model(json!({ "list": [{ "a": 1 }], "o": { "b": 2 } }));
        let created = create_reactive_model(&defaults, &SyncOptions::new()).unwrap_or_default();
        assert_eq!(created.to_json(), defaults.to_json());

        let defaults_object = defaults.as_object().cloned().unwrap_or_default();
        assert!(!defaults_object.is_reactive("list"));
        let Some(list) = defaults_object.peek("list") else {
            panic!("list missing");
        };
        assert!(!list.as_array().is_some_and(Array::is_bridged));

        let created_object = created.as_object().cloned().unwrap_or_default();
        assert!(created_object.is_reactive("list"));
        assert!(created_object.peek("list").is_some_and(|v| !v.same(&list)));
    }

    #[test]
    fn create_reactive_model_of_scalar() {
        let created = create_reactive_model(&Value::from("x"), &SyncOptions::new());
        assert_eq!(created.ok().and_then(|v| v.as_str().map(str::to_owned)), Some("x".into()));
    }
}
