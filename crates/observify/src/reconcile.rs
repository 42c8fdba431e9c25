#![forbid(unsafe_code)]

//! Key-based matching of array items across a merge.

use crate::value::Value;

/// Order `incoming` against `existing` by the `key` field of their objects.
///
/// Each existing object is replaced by the first unused incoming object whose
/// key is identical. A missing key counts as `Undefined`, so key-less objects
/// match each other in order. Non-object items never match, and unmatched
/// existing items stay where they are. Incoming items left unused are appended in their original
/// order. The result is meant to be merged positionally into `existing`, so
/// matched items land on the existing object they identify.
///
/// # Example
///
/// ```
/// use observify::{reconcile, Value};
/// use serde_json::json;
///
/// let existing = Value::from(json!([{ "id": 1 }, { "id": 2 }]));
/// let incoming = Value::from(json!([{ "id": 2, "x": true }, { "id": 3 }]));
/// let (Some(existing), Some(incoming)) = (existing.as_array(), incoming.as_array()) else {
///     unreachable!()
/// };
///
/// let merged = reconcile(&existing.to_vec(), &incoming.to_vec(), "id");
/// let ids: Vec<_> = merged.iter().map(|v| v.to_json()["id"].clone()).collect();
/// assert_eq!(ids, [json!(1), json!(2), json!(3)]);
/// ```
#[must_use]
pub fn reconcile(existing: &[Value], incoming: &[Value], key: &str) -> Vec<Value> {
    let mut consumed = vec![false; incoming.len()];
    let mut merged = Vec::with_capacity(existing.len().max(incoming.len()));
    let mut matched = 0usize;

    for item in existing {
        let found = key_of(item, key).and_then(|wanted| {
            incoming.iter().enumerate().position(|(index, candidate)| {
                !consumed[index] && key_of(candidate, key).is_some_and(|k| k.same(&wanted))
            })
        });
        match found {
            Some(index) => {
                consumed[index] = true;
                matched += 1;
                merged.push(incoming[index].clone());
            }
            None => merged.push(item.clone()),
        }
    }

    let appended = consumed.iter().filter(|used| !**used).count();
    merged.extend(
        incoming
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(item, _)| item.clone()),
    );

    tracing::debug!(
        message = "observify.reconcile",
        key,
        existing = existing.len(),
        incoming = incoming.len(),
        matched,
        appended
    );
    merged
}

/// The key value of an object item, `Undefined` when the field is missing.
/// Non-objects have no key.
fn key_of(item: &Value, key: &str) -> Option<Value> {
    Some(item.as_object()?.peek(key).unwrap_or_default())
}
