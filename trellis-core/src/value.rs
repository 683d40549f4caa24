//! Values
//!
//! The dynamic value type that flows through reactive state. Primitives are
//! held inline; containers (`Object`, `Array`) are shared handles, so cloning
//! a `Value` never copies a container's contents.
//!
//! # Identity
//!
//! Equality is strict identity, the same rule the observer graph uses to decide
//! whether a write is a change:
//!
//! - primitives compare by value (`NaN` is never equal to itself)
//! - containers compare by handle, so two structurally equal objects built
//!   separately are *different* values

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ReactiveError, Result};
use crate::object::{Object, ObjectId};
use crate::reactive::EvalContext;

/// A value stored in (or read from) reactive state.
#[derive(Clone, Default)]
pub enum Value {
    /// The result of reading anything that is not there.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Array(Array),
    Object(Object),
}

impl Value {
    /// Strict identity comparison.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Whether this value is a container that can carry properties.
    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Look up a single path segment on this value.
    ///
    /// Objects go through their property slots (and therefore through
    /// dependency tracking). Arrays accept numeric indices and `length`;
    /// strings accept `length`. Everything else yields `Undefined`.
    pub fn member(&self, key: &str, ctx: &EvalContext) -> Value {
        match self {
            Value::Object(object) => object.get_with(key, ctx),
            Value::Array(array) if key == "length" => Value::from(array.len()),
            Value::Array(array) => array_index(key)
                .map(|index| array.get(index))
                .unwrap_or_default(),
            Value::String(s) if key == "length" => Value::from(s.encode_utf16().count()),
            _ => Value::Undefined,
        }
    }

    /// Build a value tree from JSON. Objects come out plain (not observed).
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => Value::Array(
                items.into_iter().map(Value::from_json).collect::<Vec<_>>().into(),
            ),
            serde_json::Value::Object(map) => Value::Object(Object::from_json_map(map)),
        }
    }

    /// Snapshot this value as JSON.
    ///
    /// Reads are untracked. Computed properties are skipped, `Undefined` and
    /// non-finite numbers become `null`, and an object met again while it is
    /// still being serialized is cut off as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_inner(&mut HashSet::new())
    }

    fn to_json_inner(&self, open: &mut HashSet<ObjectId>) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(array) => serde_json::Value::Array(
                array
                    .to_vec()
                    .iter()
                    .map(|item| item.to_json_inner(open))
                    .collect(),
            ),
            Value::Object(object) => {
                if !open.insert(object.id()) {
                    return serde_json::Value::Null;
                }
                let map = object
                    .enumerable_entries()
                    .into_iter()
                    .map(|(key, value)| (key, value.to_json_inner(open)))
                    .collect();
                open.remove(&object.id());
                serde_json::Value::Object(map)
            }
        }
    }
}

/// Parse a path segment as an array index.
///
/// Only canonical decimal indices qualify: ASCII digits, no sign, and no
/// leading zero unless the segment is exactly `0`.
pub(crate) fn array_index(key: &str) -> Option<usize> {
    let canonical = match key.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    };
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // Covers -0 as well.
        f.write_str("0")
    } else {
        write!(f, "{}", n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

/// Text rendering, as an interpolation site would display the value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(array) => {
                for (i, item) in array.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(array) => fmt::Debug::fmt(array, f),
            Value::Object(object) => fmt::Debug::fmt(object, f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

// ----------------------------------------------------------------------------
// Arrays
// ----------------------------------------------------------------------------

/// A shared, mutable list.
///
/// Arrays are never intercepted: writes through an `Array` handle do not
/// notify anyone. Objects stored inside an array are still made observable
/// when the surrounding state is wrapped.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element at `index`, or `Undefined` past the end.
    pub fn get(&self, index: usize) -> Value {
        self.0.read().get(index).cloned().unwrap_or_default()
    }

    /// Overwrite element `index`, or append when `index` equals the length.
    /// Anything further out is rejected.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let mut items = self.0.write();
        let len = items.len();
        match index.cmp(&len) {
            std::cmp::Ordering::Less => items[index] = value.into(),
            std::cmp::Ordering::Equal => items.push(value.into()),
            std::cmp::Ordering::Greater => {
                return Err(ReactiveError::IndexOutOfRange { index, len });
            }
        }
        Ok(())
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.write().push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Copy of the current elements (the elements themselves are shared).
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array").field("len", &self.len()).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
