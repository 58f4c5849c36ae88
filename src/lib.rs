//! trellis - a self-describing runtime type lattice with structurally
//! subtyped dynamic values.
//!
//! The crate answers two questions at runtime, for any value and any
//! pair of types:
//!
//! - [`Type::instance`]: is this value an instance of this type?
//! - [`Type::assignable`]: can a slot of this type hold every value of
//!   that type?
//!
//! # Model
//!
//! Every [`Value`] is cheap to clone and knows its own [`Type`]; every
//! type is itself a value, terminating in the meta-of-meta fixed point.
//! Collections ([`Array`], [`Map`]) may carry a declared type that
//! constrains mutation, and can be frozen: freezing is one-way and
//! recursive, and a frozen value is immutable and freely shareable
//! across threads.
//!
//! ```
//! use trellis::{Type, Value};
//!
//! let t = Type::array_sized(Type::integer(), 1, 3);
//! assert!(t.instance(&Value::array(vec![Value::from(1), Value::from(2)])));
//! assert!(!t.instance(&Value::array(vec![])));
//!
//! let narrower = Type::array_sized(Type::integer_range(0, 9, true), 1, 2);
//! assert!(t.assignable(&narrower));
//! ```
//!
//! # Structure
//!
//! - `value`, `string`, `binary`: the value model.
//! - `ty`: the type algebra and its factories.
//! - `assignable`: the central assignability/instance dispatcher.
//! - `array`, `map`: the collections.
//! - `alias`: named types and late binding.
//! - `reflect`: the host-reflection contract.

mod array;
mod assignable;
mod binary;
mod deep;
mod error;
mod guard;
mod identifier;
mod map;
mod reflect;
mod string;
mod ty;
mod value;

pub mod alias;

pub use alias::{AliasData, AliasMap, AliasProvider, resolve};
pub use array::Array;
pub use binary::Binary;
pub use error::{ErrorKind, Result, TypeError};
pub use identifier::TypeIdentifier;
pub use map::{Map, MapEntry};
pub use reflect::ReflectType;
pub use string::Str;
pub use ty::{StructMapEntry, Type, TypeKind, UNBOUNDED};
pub use value::Value;
