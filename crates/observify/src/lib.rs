#![forbid(unsafe_code)]

//! Reactive models from plain data trees.
//!
//! `observify` turns a nested tree of objects, arrays and scalars into a
//! *reactive model*: the same tree, with every object property backed by an
//! observable cell. New data is merged into an existing model in place, so
//! cells (and everything subscribed to them) survive any number of updates.
//!
//! - [`synchronize`] merges incoming data into a model; [`observe`] reifies
//!   a tree in place; [`create_reactive_model`] builds a fresh model.
//! - [`reify_property`] backs a single property by a cell.
//! - [`reconcile`] matches array items by a key field instead of by
//!   position, for the properties configured in [`SyncOptions`].
//! - Arrays held by an array cell report `push`, `splice` and the other
//!   in-place mutations to the cell.
//!
//! # Example
//!
//! ```
//! use observify::{synchronize, create_reactive_model, SyncOptions, Value};
//! use serde_json::json;
//!
//! let options = SyncOptions::new().with_array_key("people", "id");
//! let model = create_reactive_model(
//!     &Value::from(json!({ "people": [{ "id": 1, "name": "Jane" }] })),
//!     &options,
//! )?;
//!
//! let people = model.as_object().and_then(|o| o.cell("people")).unwrap();
//! let jane = people.peek().as_array().and_then(|a| a.get(0)).unwrap();
//!
//! synchronize(
//!     &model,
//!     &Value::from(json!({ "people": [{ "id": 2, "name": "John" }, { "id": 1, "age": 28 }] })),
//!     &options,
//! )?;
//!
//! assert_eq!(
//!     model.to_json(),
//!     json!({ "people": [{ "id": 1, "name": "Jane", "age": 28 }, { "id": 2, "name": "John" }] })
//! );
//! // The object for id 1 is still the one observers were bound to.
//! assert!(people.peek().as_array().and_then(|a| a.get(0)).unwrap().same(&jane));
//! # Ok::<(), observify::SyncError>(())
//! ```
//!
//! # Threading
//!
//! Models are built on `Rc<RefCell<..>>` and are neither `Send` nor `Sync`.
//! Notifications are delivered synchronously, after internal borrows are
//! released.

mod array;
mod bridge;
mod cell;
mod error;
mod object;
mod options;
mod reconcile;
mod reify;
mod sync;
mod value;

pub use array::Array;
pub use cell::{AnyCell, ArrayCell, ComputedCell, is_cell};
pub use error::{Result, SyncError};
pub use object::Object;
pub use options::SyncOptions;
pub use reconcile::reconcile;
pub use reify::{
    define_computed_property, define_writable_computed_property, reify_property, track,
};
pub use sync::{create_reactive_model, observe, synchronize};
pub use value::{Kind, Value};

pub use observify_reactive::{Computed, Observable, Subscription};
