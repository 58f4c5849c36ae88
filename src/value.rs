//! Runtime values.
//!
//! `Value` is the universal element of the system. Scalars are stored
//! inline; strings, binaries, collections and entries hold shared heap
//! data behind `Arc`s, so cloning a value is always cheap. Types are
//! themselves values (`Value::Type`), which is what makes the lattice
//! self-describing.
//!
//! Equality, hashing and comparison are structural and cycle-safe: a
//! collection that (transitively) contains itself compares and hashes
//! without recursing forever. Equal values always hash equally.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::array::Array;
use crate::binary::Binary;
use crate::deep;
use crate::error::Result;
use crate::guard::{RecursionGuard, Seen};
use crate::identifier::TypeIdentifier;
use crate::map::{Map, MapEntry};
use crate::string::Str;
use crate::ty::Type;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// The nil value.
    Nil,
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer value.
    Integer(i64),
    /// 64-bit floating point value.
    Float(f64),
    /// Immutable string value.
    String(Str),
    /// Byte-sequence value.
    Binary(Binary),
    /// Ordered sequence of values.
    Array(Array),
    /// Insertion-ordered map of values.
    Map(Map),
    /// A key/value pair, as yielded by [`Map::entries`].
    Entry(MapEntry),
    /// A type. Every type is a value.
    Type(Type),
}

// Factory methods

impl Value {
    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<Str>) -> Self {
        Value::String(s.into())
    }

    /// Create an integer value.
    #[inline]
    pub fn integer(n: i64) -> Self {
        Value::Integer(n)
    }

    /// Create a float value.
    #[inline]
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a boolean value.
    #[inline]
    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    /// Create a mutable binary value holding a copy of `bytes`.
    #[inline]
    pub fn binary(bytes: &[u8]) -> Self {
        Value::Binary(Binary::new(bytes, false))
    }

    /// Create a mutable array value from `values`.
    #[inline]
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Array::from_values(values))
    }

    /// Create a mutable map value from `pairs`, in order.
    #[inline]
    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        Value::Map(Map::from_pairs(pairs))
    }

    /// Create an entry value.
    #[inline]
    pub fn entry(key: Value, value: Value) -> Self {
        Value::Entry(MapEntry::new(key, value))
    }
}

// Accessors

impl Value {
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&MapEntry> {
        match self {
            Value::Entry(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }
}

impl Value {
    /// The type of this value.
    ///
    /// Primitives yield an exact type backed by themselves; collections
    /// yield their declared type when one is set, else an exact type;
    /// types yield a meta type.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Nil => Type::nil(),
            Value::Boolean(true) => Type::true_type(),
            Value::Boolean(false) => Type::false_type(),
            Value::Array(a) => a.type_of(),
            Value::Map(m) => m.type_of(),
            Value::Type(t) => t.type_of(),
            _ => Type::exact(self.clone()),
        }
    }

    /// The identifier of [`Value::type_of`], without constructing the
    /// type for the scalar cases.
    pub fn type_identifier(&self) -> TypeIdentifier {
        match self {
            Value::Nil => TypeIdentifier::Nil,
            Value::Boolean(true) => TypeIdentifier::True,
            Value::Boolean(false) => TypeIdentifier::False,
            Value::Integer(_) => TypeIdentifier::IntegerExact,
            Value::Float(_) => TypeIdentifier::FloatExact,
            Value::String(_) => TypeIdentifier::StringExact,
            Value::Binary(_) => TypeIdentifier::BinaryExact,
            Value::Entry(_) => TypeIdentifier::MapEntryExact,
            Value::Array(a) => a.type_of().type_identifier(),
            Value::Map(m) => m.type_of().type_identifier(),
            Value::Type(t) => t.type_of().type_identifier(),
        }
    }

    /// Structural hash. Equal values hash equally; cyclic values hash
    /// without recursing forever.
    pub fn hash_code(&self) -> u64 {
        deep::value_hash(&mut Seen::default(), self)
    }

    /// Total-order comparison where one is defined.
    ///
    /// Nil sorts before everything; integers and floats compare
    /// numerically across kinds; arrays compare elementwise with length
    /// as the final tie-break. Kinds with no defined order return `None`.
    pub fn compare_to(&self, other: &Value) -> Option<Ordering> {
        deep::value_compare(&mut RecursionGuard::default(), self, other)
    }

    /// True when this value cannot be mutated. Scalars, strings and
    /// types are always frozen; binaries and collections report their
    /// freeze flag; an entry is frozen when both of its halves are.
    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Binary(b) => b.is_frozen(),
            Value::Array(a) => a.is_frozen(),
            Value::Map(m) => m.is_frozen(),
            Value::Entry(e) => e.key().is_frozen() && e.value().is_frozen(),
            _ => true,
        }
    }

    /// Recursively freeze this value in place. One-way.
    pub fn freeze(&self) -> Result<()> {
        match self {
            Value::Binary(b) => {
                b.freeze();
                Ok(())
            }
            Value::Array(a) => a.freeze(),
            Value::Map(m) => m.freeze(),
            Value::Entry(e) => {
                e.key().freeze()?;
                e.value().freeze()
            }
            _ => Ok(()),
        }
    }

    /// A deep-frozen copy of this value. The receiver is not mutated;
    /// values that are already frozen are returned as-is.
    pub fn frozen_copy(&self) -> Result<Value> {
        match self {
            Value::Binary(b) => Ok(Value::Binary(b.frozen_copy())),
            Value::Array(a) => Ok(Value::Array(a.frozen_copy()?)),
            Value::Map(m) => Ok(Value::Map(m.frozen_copy()?)),
            Value::Entry(e) => Ok(Value::Entry(e.frozen_copy()?)),
            _ => Ok(self.clone()),
        }
    }

    /// Pointer-derived identity for the heap variants that can appear in
    /// reference cycles. Scalars have no identity.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.identity()),
            Value::Map(m) => Some(m.identity()),
            Value::Entry(e) => Some(e.identity()),
            Value::Binary(b) => Some(b.identity()),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep::value_equals(&mut RecursionGuard::default(), self, other)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

// Conversions from host types

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Str::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Str::from(s))
    }
}

impl From<Str> for Value {
    fn from(s: Str) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Binary(Binary::from_vec(bytes))
    }
}

impl From<Binary> for Value {
    fn from(b: Binary) -> Self {
        Value::Binary(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(Array::from_values(values))
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<MapEntry> for Value {
    fn from(e: MapEntry) -> Self {
        Value::Entry(e)
    }
}

impl From<Type> for Value {
    fn from(t: Type) -> Self {
        Value::Type(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Nil,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => format_float(f, *x),
            Value::String(s) => write!(f, "{:?}", s.as_str()),
            Value::Binary(b) => write!(f, "{b}"),
            Value::Array(a) => write!(f, "{a}"),
            Value::Map(m) => write!(f, "{m}"),
            Value::Entry(e) => write!(f, "{e}"),
            Value::Type(t) => write!(f, "{t}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Binary(b) => write!(f, "{b:?}"),
            Value::Array(a) => write!(f, "{a:?}"),
            Value::Map(m) => write!(f, "{m:?}"),
            Value::Entry(e) => write!(f, "{e:?}"),
            Value::Type(t) => write!(f, "Type({t})"),
        }
    }
}

/// Floats always render with a decimal point so they stay
/// distinguishable from integers.
fn format_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

#[cfg(test)]
mod tests;
