#![forbid(unsafe_code)]

//! The value tree shared by reactive models and incoming data.
//!
//! A [`Value`] is resolved once per recursive step into one of four
//! [`Kind`]s: scalar, object, array or pre-built cell. Objects and arrays are
//! shared handles with reference identity; scalars are compared by value.
//!
//! # Identity
//!
//! [`Value::same`] (also used by `PartialEq`) is the "differs by identity"
//! test of the synchronizer: two composites are the same only if they are the
//! same instance, no matter their contents. Use [`Value::to_json`] to compare
//! contents.

use std::fmt;

use observify_reactive::{Computed, Observable};
use serde_json::Number;

use crate::array::Array;
use crate::cell::AnyCell;
use crate::object::Object;

/// Shape of a value, as seen by the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Scalar,
    Object,
    Array,
    Cell,
}

#[derive(Clone, Default)]
pub enum Value {
    /// Absent value; also stands in for array holes.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Object(Object),
    Array(Array),
    /// A pre-built cell stored as plain data.
    Cell(AnyCell),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Object(_) => Kind::Object,
            Self::Array(_) => Kind::Array,
            Self::Cell(_) => Kind::Cell,
            _ => Kind::Scalar,
        }
    }

    /// Objects and arrays.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self.kind(), Kind::Object | Kind::Array)
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_cell(&self) -> Option<&AnyCell> {
        match self {
            Self::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Scalars by value, composites and cells by instance.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || a.as_f64() == b.as_f64(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Cell(a), Self::Cell(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Short name of the shape, for error messages and logs.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Cell(_) => "cell",
        }
    }

    /// A fresh empty composite of the same kind, if this is a composite.
    #[must_use]
    pub fn empty_like(&self) -> Option<Value> {
        match self {
            Self::Object(_) => Some(Self::Object(Object::new())),
            Self::Array(_) => Some(Self::Array(Array::new())),
            _ => None,
        }
    }

    /// Snapshot as JSON, reading through every cell without tracking.
    ///
    /// `Undefined` becomes `null`. Cyclic trees recurse without bound.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Object(object) => serde_json::Value::Object(
                object
                    .entries()
                    .into_iter()
                    .map(|(name, value)| (name, value.to_json()))
                    .collect(),
            ),
            Self::Array(array) => {
                serde_json::Value::Array(array.to_vec().iter().map(Value::to_json).collect())
            }
            Self::Cell(cell) => cell.peek().to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Object(object) => fmt::Debug::fmt(object, f),
            Self::Array(array) => fmt::Debug::fmt(array, f),
            Self::Cell(cell) => fmt::Debug::fmt(cell, f),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(Array::from_vec(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => Self::Object(Object::from_entries(map)),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Self::from(json.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite numbers have no JSON representation and become `null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Self::Array(array)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Array::from_vec(items))
    }
}

impl From<AnyCell> for Value {
    fn from(cell: AnyCell) -> Self {
        Self::Cell(cell)
    }
}

impl From<Observable<Value>> for Value {
    fn from(observable: Observable<Value>) -> Self {
        Self::Cell(AnyCell::from(observable))
    }
}

impl From<Computed<Value>> for Value {
    fn from(computed: Computed<Value>) -> Self {
        Self::Cell(AnyCell::from(computed))
    }
}
