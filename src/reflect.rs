//! The host-reflection contract.
//!
//! Every type names its nearest host representation through a
//! [`ReflectType`] descriptor, and values convert into host slots via
//! `TryFrom`. Frozen collections convert by copy, never by handing out
//! a writable alias of their storage.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::error::{self, TypeError};
use crate::ty::{Type, TypeKind};
use crate::value::Value;

/// A descriptor of the host type nearest to a core type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ReflectType {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    /// A host vector of the element's host type.
    Slice(Box<ReflectType>),
    /// A host map between the keys' and values' host types.
    Map(Box<ReflectType>, Box<ReflectType>),
    /// The dynamic value type itself.
    Value,
    /// A type handle.
    Type,
    /// A host type outside the type language.
    Native { id: TypeId, name: &'static str },
}

impl ReflectType {
    /// The `TypeId` of the host representation. One level of element
    /// specialization is reported for slices; deeper nesting falls back
    /// to vectors of dynamic values.
    pub fn type_id(&self) -> TypeId {
        match self {
            ReflectType::Bool => TypeId::of::<bool>(),
            ReflectType::Int => TypeId::of::<i64>(),
            ReflectType::Float => TypeId::of::<f64>(),
            ReflectType::Str => TypeId::of::<String>(),
            ReflectType::Bytes => TypeId::of::<Vec<u8>>(),
            ReflectType::Slice(elem) => match **elem {
                ReflectType::Bool => TypeId::of::<Vec<bool>>(),
                ReflectType::Int => TypeId::of::<Vec<i64>>(),
                ReflectType::Float => TypeId::of::<Vec<f64>>(),
                ReflectType::Str => TypeId::of::<Vec<String>>(),
                _ => TypeId::of::<Vec<Value>>(),
            },
            ReflectType::Map(_, _) => TypeId::of::<HashMap<Value, Value>>(),
            ReflectType::Value => TypeId::of::<Value>(),
            ReflectType::Type => TypeId::of::<Type>(),
            ReflectType::Native { id, .. } => *id,
        }
    }
}

impl fmt::Display for ReflectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectType::Bool => f.write_str("bool"),
            ReflectType::Int => f.write_str("i64"),
            ReflectType::Float => f.write_str("f64"),
            ReflectType::Str => f.write_str("String"),
            ReflectType::Bytes => f.write_str("Vec<u8>"),
            ReflectType::Slice(elem) => write!(f, "Vec<{elem}>"),
            ReflectType::Map(k, v) => write!(f, "HashMap<{k}, {v}>"),
            ReflectType::Value => f.write_str("Value"),
            ReflectType::Type => f.write_str("Type"),
            ReflectType::Native { name, .. } => f.write_str(name),
        }
    }
}

impl Type {
    /// The host type nearest to this type. Exact types report the host
    /// type of the value they wrap.
    pub fn reflect_type(&self) -> ReflectType {
        match self.kind() {
            TypeKind::Any | TypeKind::Nil => ReflectType::Value,
            TypeKind::Boolean | TypeKind::True | TypeKind::False => ReflectType::Bool,
            TypeKind::Integer | TypeKind::IntegerRange { .. } => ReflectType::Int,
            TypeKind::Float | TypeKind::FloatRange { .. } => ReflectType::Float,
            TypeKind::String
            | TypeKind::StringSized { .. }
            | TypeKind::StringPattern(_)
            | TypeKind::Ci(_) => ReflectType::Str,
            TypeKind::Binary => ReflectType::Bytes,
            TypeKind::Array => ReflectType::Slice(Box::new(ReflectType::Value)),
            TypeKind::ArraySized { elem, .. } => {
                ReflectType::Slice(Box::new(elem.reflect_type()))
            }
            TypeKind::Tuple { .. } => ReflectType::Slice(Box::new(ReflectType::Value)),
            TypeKind::Map => ReflectType::Map(
                Box::new(ReflectType::Value),
                Box::new(ReflectType::Value),
            ),
            TypeKind::MapSized { key, value, .. } => ReflectType::Map(
                Box::new(key.reflect_type()),
                Box::new(value.reflect_type()),
            ),
            TypeKind::StructMap { .. } => ReflectType::Map(
                Box::new(ReflectType::Str),
                Box::new(ReflectType::Value),
            ),
            TypeKind::AllOf(_) | TypeKind::AnyOf(_) | TypeKind::OneOf(_) | TypeKind::Not(_) => {
                ReflectType::Value
            }
            TypeKind::Exact(v) => v.type_of().generic().reflect_type(),
            TypeKind::Meta(_) => ReflectType::Type,
            TypeKind::Native { id, name } => ReflectType::Native {
                id: *id,
                name,
            },
            TypeKind::Alias(_) => match crate::ty::follow_alias(self) {
                Some(t) => t.reflect_type(),
                None => ReflectType::Value,
            },
        }
    }
}

#[cold]
fn mismatch(value: &Value, host: &str) -> TypeError {
    error::type_assertion(format!("value {value} does not reflect into {host}"))
}

impl TryFrom<&Value> for i64 {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value.as_integer().ok_or_else(|| mismatch(value, "i64"))
    }
}

impl TryFrom<&Value> for f64 {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value.as_float().ok_or_else(|| mismatch(value, "f64"))
    }
}

impl TryFrom<&Value> for bool {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value.as_boolean().ok_or_else(|| mismatch(value, "bool"))
    }
}

impl TryFrom<&Value> for String {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch(value, "String"))
    }
}

impl TryFrom<&Value> for Vec<u8> {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value
            .as_binary()
            .map(|b| b.to_vec())
            .ok_or_else(|| mismatch(value, "Vec<u8>"))
    }
}

impl TryFrom<&Value> for Vec<Value> {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value
            .as_array()
            .map(|a| a.values())
            .ok_or_else(|| mismatch(value, "Vec<Value>"))
    }
}

impl TryFrom<&Value> for HashMap<Value, Value> {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value
            .as_map()
            .map(|m| m.snapshot().into_iter().collect())
            .ok_or_else(|| mismatch(value, "HashMap<Value, Value>"))
    }
}

impl TryFrom<&Value> for Type {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, TypeError> {
        value
            .as_type()
            .cloned()
            .ok_or_else(|| mismatch(value, "Type"))
    }
}
