//! # Value Module
//!
//! The dynamically typed value model used for spy arguments, receivers and
//! mock return values.
//!
//! Spies record whatever a test hands them, so a [`Value`] can hold plain
//! data (strings, numbers, lists, maps) as well as references whose identity
//! must survive recording: [`Value::Shared`] for structured objects and
//! [`Value::Opaque`] for arbitrary Rust values.

use serde::{Serialize, Serializer};
use serde_json::Value as Json;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A reference to an arbitrary Rust value.
///
/// Opaque values have no structure the comparator can inspect, so two of
/// them are equal only when they point at the same allocation.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Rc<dyn Any>,
}

impl Opaque {
    /// Wraps `value` in a new reference-counted allocation.
    pub fn new<T: Any>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    /// Wraps an existing `Rc`, keeping its identity.
    pub fn from_rc<T: Any>(value: Rc<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: value,
        }
    }

    /// Name of the wrapped type, used when rendering diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns true if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Rc::as_ptr(&self.inner) as *const () == Rc::as_ptr(&other.inner) as *const ()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque<{}>", self.type_name)
    }
}

/// A recorded value.
///
/// Cloning a `Value` is cheap for the reference variants: the clone of a
/// [`Value::Shared`] or [`Value::Opaque`] is the *same* object, which keeps
/// identity checks valid against whatever the test passed in.
#[derive(Debug, Clone)]
pub enum Value {
    /// No value. Returned by spies that have no mock implementation.
    Undefined,

    /// An explicit null.
    Null,

    /// A boolean.
    Bool(bool),

    /// An integer.
    Int(i64),

    /// A floating point number.
    Float(f64),

    /// A string.
    Str(String),

    /// An ordered list of values.
    List(Vec<Value>),

    /// A map with string keys.
    Map(BTreeMap<String, Value>),

    /// A reference-typed object, compared structurally but identity-preserving.
    Shared(Rc<Value>),

    /// An arbitrary Rust value, compared by identity only.
    Opaque(Opaque),
}

impl Value {
    /// Wraps a value into a shared reference.
    ///
    /// # Example
    ///
    /// ```rust
    /// use strict_spies_core::value::Value;
    ///
    /// let obj = Value::shared(Value::object([("hello", "world")]));
    /// let same = obj.clone();
    /// let twin = Value::shared(Value::object([("hello", "world")]));
    ///
    /// assert!(obj.same_ref(&same));
    /// assert!(!obj.same_ref(&twin));
    /// assert_eq!(obj, twin);
    /// ```
    pub fn shared(value: impl Into<Value>) -> Self {
        Value::Shared(Rc::new(value.into()))
    }

    /// Wraps an arbitrary Rust value into an opaque reference.
    pub fn opaque<T: Any>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    /// Builds a map from key/value pairs.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Builds a list from anything convertible into values.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Follows [`Value::Shared`] references down to the underlying value.
    pub fn resolve(&self) -> &Value {
        match self {
            Value::Shared(inner) => inner.resolve(),
            other => other,
        }
    }

    /// Returns true if both values are references to the same object.
    ///
    /// Plain data never has identity, so this is false for everything but
    /// [`Value::Shared`] and [`Value::Opaque`].
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Shared(a), Value::Shared(b)) => Rc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Returns true for `Undefined`, looking through `Shared`.
    pub fn is_undefined(&self) -> bool {
        matches!(self.resolve(), Value::Undefined)
    }

    /// String view.
    pub fn as_str(&self) -> Option<&str> {
        match self.resolve() {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view. Floats return `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match self.resolve() {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view, accepting both integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self.resolve() {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// List view.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self.resolve() {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Map view.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self.resolve() {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The wrapped opaque handle, if any.
    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self.resolve() {
            Value::Opaque(opaque) => Some(opaque),
            _ => None,
        }
    }
}

/// Structural equality between two values.
///
/// Integers and floats compare numerically, `NaN` equals `NaN`, and `0.0`
/// differs from `-0.0`. Shared references compare by content, so a shared
/// object equals an unshared one of the same shape. Opaque values compare by
/// identity.
///
/// # Example
///
/// ```rust
/// use strict_spies_core::value::{deep_equals, Value};
///
/// assert!(deep_equals(&Value::from(5), &Value::from(5.0)));
/// assert!(deep_equals(
///     &Value::shared(Value::object([("a", 1)])),
///     &Value::object([("a", 1)]),
/// ));
/// assert!(!deep_equals(&Value::from(0.0), &Value::from(-0.0)));
/// ```
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    if a.same_ref(b) {
        return true;
    }

    match (a.resolve(), b.resolve()) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            numbers_equal(*x as f64, *y)
        }
        (Value::Float(x), Value::Float(y)) => numbers_equal(*x, *y),
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equals(l, r))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| deep_equals(l, r)))
        }
        (Value::Opaque(x), Value::Opaque(y)) => x.ptr_eq(y),
        _ => false,
    }
}

fn numbers_equal(x: f64, y: f64) -> bool {
    if x.is_nan() || y.is_nan() {
        x.is_nan() && y.is_nan()
    } else if x == 0.0 && y == 0.0 {
        x.is_sign_negative() == y.is_sign_negative()
    } else {
        x == y
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equals(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_nan() => f.write_str("NaN"),
            Value::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Value::List(items) if items.is_empty() => f.write_str("[]"),
            Value::List(items) => {
                f.write_str("[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(" ]")
            }
            Value::Map(map) if map.is_empty() => f.write_str("{}"),
            Value::Map(map) => {
                f.write_str("{ ")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str(" }")
            }
            Value::Shared(inner) => fmt::Display::fmt(inner.as_ref(), f),
            Value::Opaque(opaque) => write!(f, "<{}>", opaque.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
            Value::Shared(inner) => inner.as_ref().serialize(serializer),
            Value::Opaque(opaque) => {
                serializer.serialize_str(&format!("<{}>", opaque.type_name()))
            }
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or(Value::Float(i as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<Opaque> for Value {
    fn from(opaque: Opaque) -> Self {
        Value::Opaque(opaque)
    }
}

impl From<Rc<Value>> for Value {
    fn from(inner: Rc<Value>) -> Self {
        Value::Shared(inner)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Builds a `Vec<Value>` from heterogeneous expressions.
///
/// ```rust
/// use strict_spies_core::args;
/// use strict_spies_core::value::Value;
///
/// let args = args!["hello", 5, true];
/// assert_eq!(args, vec![Value::from("hello"), Value::from(5), Value::from(true)]);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::from($arg)),+]
    };
}

/// Builds an expected call sequence, one bracketed record per call.
///
/// ```rust
/// use strict_spies_core::calls;
///
/// let expected = calls![
///     ["callback1", "a"],
///     ["callback2"],
/// ];
/// assert_eq!(expected.len(), 2);
/// assert!(calls![].is_empty());
/// ```
#[macro_export]
macro_rules! calls {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($([$($item:expr),* $(,)?]),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::List($crate::args![$($item),*])),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_across_representations() {
        assert_eq!(Value::from(30), Value::from(30.0));
        assert_ne!(Value::from(30), Value::from(31.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn test_shared_identity_and_structure() {
        let original = Value::shared(Value::object([("hello", "world")]));
        let clone = original.clone();
        let twin = Value::object([("hello", "world")]);

        assert!(original.same_ref(&clone));
        assert!(!original.same_ref(&twin));
        assert_eq!(original, twin);
    }

    #[test]
    fn test_opaque_compares_by_identity() {
        let handle = Opaque::new(String::from("socket"));
        let a = Value::Opaque(handle.clone());
        let b = Value::Opaque(handle);
        let other = Value::opaque(String::from("socket"));

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(
            a.as_opaque().and_then(|o| o.downcast_ref::<String>()),
            Some(&"socket".to_string())
        );
    }

    #[test]
    fn test_opaque_from_rc_keeps_identity() {
        let conn = Rc::new(42_u16);
        let a = Value::Opaque(Opaque::from_rc(Rc::clone(&conn)));
        let b = Value::Opaque(Opaque::from_rc(conn));
        let other = Value::opaque(42_u16);

        assert_eq!(a, b);
        assert!(a.same_ref(&b));
        assert_ne!(a, other);
        assert_eq!(a.as_opaque().map(Opaque::type_name), Some("u16"));
    }

    #[test]
    fn test_map_comparison_ignores_insertion_order() {
        let a = Value::object([("x", 1), ("y", 2)]);
        let b = Value::object([("y", 2), ("x", 1)]);
        let c = Value::object([("x", 1)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_undefined_differs_from_null() {
        assert_ne!(Value::Undefined, Value::Null);
        assert!(Value::from(()).is_undefined());
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!(["cb", { "hello": "world" }, 5, 1.5, null]));
        let expected = Value::list([
            Value::from("cb"),
            Value::object([("hello", "world")]),
            Value::from(5),
            Value::from(1.5),
            Value::Null,
        ]);

        assert_eq!(value, expected);
    }

    #[test]
    fn test_display() {
        let value = args!["cb", Value::object([("hello", "world")]), 5, ()];
        assert_eq!(
            Value::List(value).to_string(),
            "[ 'cb', { hello: 'world' }, 5, undefined ]"
        );
        assert_eq!(Value::List(vec![]).to_string(), "[]");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_serialize() {
        let value = Value::list([
            Value::from("cb"),
            Value::shared(Value::object([("n", 1)])),
            Value::Undefined,
        ]);

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, json!(["cb", { "n": 1 }, null]));
    }

    #[test]
    fn test_calls_macro() {
        let expected = calls![["cb", "hello", "world"], ["other"], []];

        assert_eq!(expected.len(), 3);
        assert_eq!(expected[0].as_list().map(<[Value]>::len), Some(3));
        assert_eq!(expected[2], Value::List(vec![]));
    }
}
