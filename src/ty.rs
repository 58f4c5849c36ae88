//! The type algebra.
//!
//! A [`Type`] is an immutable shared handle onto a [`TypeKind`].
//! Construction goes through factory functions that normalize trivial
//! cases (an unconstrained array collapses to the default array type, a
//! one-point integer range collapses to an exact type) and intern the
//! default types as process singletons.
//!
//! Types answer two questions at runtime: `assignable` ("can a slot of
//! this type hold every value of that type?") and `instance` ("does
//! this value belong to the type?"). Both are implemented by the
//! central dispatcher in the `assignable` module.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::alias::AliasData;
use crate::assignable;
use crate::deep;
use crate::error::{self, Result};
use crate::guard::{RecursionGuard, Seen};
use crate::identifier::TypeIdentifier;
use crate::string::Str;
use crate::value::Value;

/// Size bound meaning "no upper limit".
pub const UNBOUNDED: usize = usize::MAX;

/// One entry of a struct-map type: a key type (an exact string), the
/// type of the value stored under that key, and whether the key must be
/// present.
#[derive(Clone)]
pub struct StructMapEntry {
    key: Type,
    value: Type,
    required: bool,
}

impl StructMapEntry {
    /// An entry with an explicit key type.
    pub fn new(key: Type, value: Type, required: bool) -> Self {
        StructMapEntry {
            key,
            value,
            required,
        }
    }

    /// An entry keyed by the exact string `key`.
    pub fn named(key: impl Into<Str>, value: Type, required: bool) -> Self {
        StructMapEntry {
            key: Type::exact(Value::String(key.into())),
            value,
            required,
        }
    }

    #[inline]
    pub fn key(&self) -> &Type {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &Type {
        &self.value
    }

    #[inline]
    pub fn required(&self) -> bool {
        self.required
    }
}

/// The variants of the type lattice.
pub enum TypeKind {
    /// Matches every value.
    Any,
    /// Matches only nil.
    Nil,
    /// Matches `true` and `false`.
    Boolean,
    /// Matches only `true`.
    True,
    /// Matches only `false`.
    False,
    /// Matches every integer.
    Integer,
    /// Integers within a range. `inclusive` governs `max` only; `min`
    /// is always inclusive.
    IntegerRange {
        min: i64,
        max: i64,
        inclusive: bool,
    },
    /// Matches every float.
    Float,
    /// Floats within a range.
    FloatRange {
        min: f64,
        max: f64,
        inclusive: bool,
    },
    /// Matches every string.
    String,
    /// Strings whose byte length lies within the bounds.
    StringSized { min: usize, max: usize },
    /// Strings matching a compiled pattern.
    StringPattern(Regex),
    /// Case-insensitive exact string; holds the lowercased form.
    Ci(Str),
    /// Matches every binary.
    Binary,
    /// Matches every array.
    Array,
    /// Arrays with an element type and size bounds.
    ArraySized {
        elem: Type,
        min: usize,
        max: usize,
    },
    /// Arrays with per-position element types. When `variadic`, the
    /// last type must be array-kind and governs all positions past the
    /// fixed prefix.
    Tuple { types: Vec<Type>, variadic: bool },
    /// Matches every map.
    Map,
    /// Maps with key/value types and size bounds.
    MapSized {
        key: Type,
        value: Type,
        min: usize,
        max: usize,
    },
    /// Maps with per-key entry types. `additional` permits keys beyond
    /// the declared entries.
    StructMap {
        entries: Vec<StructMapEntry>,
        additional: bool,
    },
    /// Matches when all member types match.
    AllOf(Vec<Type>),
    /// Matches when at least one member type matches.
    AnyOf(Vec<Type>),
    /// Matches when exactly one member type matches.
    OneOf(Vec<Type>),
    /// Matches when the operand does not match.
    Not(Type),
    /// A type whose instance set is exactly one value.
    Exact(Value),
    /// The type of a type. `None` is the meta-of-meta fixed point.
    Meta(Option<Type>),
    /// A host type unreachable by the type language.
    Native {
        id: std::any::TypeId,
        name: &'static str,
    },
    /// A named placeholder, late-bound by alias resolution.
    Alias(AliasData),
}

/// An immutable, cheaply clonable type handle.
#[derive(Clone)]
pub struct Type(Arc<TypeKind>);

static ANY: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Any));
static NIL: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Nil));
static BOOLEAN: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Boolean));
static TRUE: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::True));
static FALSE: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::False));
static INTEGER: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Integer));
static FLOAT: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Float));
static STRING: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::String));
static BINARY: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Binary));
static ARRAY: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Array));
static MAP: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Map));
static EMPTY_TUPLE: Lazy<Type> = Lazy::new(|| {
    Type::intern(TypeKind::Tuple {
        types: Vec::new(),
        variadic: false,
    })
});
static META: Lazy<Type> = Lazy::new(|| Type::intern(TypeKind::Meta(None)));

impl Type {
    fn intern(kind: TypeKind) -> Type {
        Type(Arc::new(kind))
    }

    /// The variant of this type.
    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.0
    }

    #[inline]
    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    #[inline]
    pub(crate) fn ptr_eq(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn arc(&self) -> &Arc<TypeKind> {
        &self.0
    }

    pub(crate) fn from_arc(arc: Arc<TypeKind>) -> Type {
        Type(arc)
    }
}

// Factories

impl Type {
    /// The type of every value.
    pub fn any() -> Type {
        ANY.clone()
    }

    pub fn nil() -> Type {
        NIL.clone()
    }

    pub fn boolean() -> Type {
        BOOLEAN.clone()
    }

    /// The type matching only `true`.
    pub fn true_type() -> Type {
        TRUE.clone()
    }

    /// The type matching only `false`.
    pub fn false_type() -> Type {
        FALSE.clone()
    }

    /// The unbounded integer type.
    pub fn integer() -> Type {
        INTEGER.clone()
    }

    /// Integers in `[min, max]` (or `[min, max)` when not inclusive).
    /// Swapped bounds are reordered; a one-point inclusive range
    /// collapses to an exact type.
    pub fn integer_range(min: i64, max: i64, inclusive: bool) -> Type {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        if min == max && inclusive {
            return Type::exact(Value::Integer(min));
        }
        Type::intern(TypeKind::IntegerRange {
            min,
            max,
            inclusive,
        })
    }

    pub fn float() -> Type {
        FLOAT.clone()
    }

    /// Floats in `[min, max]` (or `[min, max)` when not inclusive).
    pub fn float_range(min: f64, max: f64, inclusive: bool) -> Type {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        if min == max && inclusive {
            return Type::exact(Value::Float(min));
        }
        Type::intern(TypeKind::FloatRange {
            min,
            max,
            inclusive,
        })
    }

    pub fn string() -> Type {
        STRING.clone()
    }

    /// Strings whose byte length lies in `[min, max]`. Swapped bounds
    /// reorder; fully unbounded collapses to the default string type.
    pub fn string_sized(min: usize, max: usize) -> Type {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        if min == 0 && max == UNBOUNDED {
            return Type::string();
        }
        Type::intern(TypeKind::StringSized { min, max })
    }

    /// Strings matching `pattern`. Fails with `ParseFailure` when the
    /// pattern does not compile.
    pub fn string_pattern(pattern: &str) -> Result<Type> {
        let re = Regex::new(pattern)
            .map_err(|e| error::parse_failure(format!("invalid pattern: {e}")))?;
        Ok(Type::intern(TypeKind::StringPattern(re)))
    }

    /// The case-insensitive exact string type for `text`.
    pub fn ci(text: &str) -> Type {
        Type::intern(TypeKind::Ci(Str::from(text.to_lowercase())))
    }

    pub fn binary() -> Type {
        BINARY.clone()
    }

    /// The unconstrained array type.
    pub fn array() -> Type {
        ARRAY.clone()
    }

    /// Arrays of `elem`, any size.
    pub fn array_of(elem: Type) -> Type {
        Type::array_sized(elem, 0, UNBOUNDED)
    }

    /// Arrays of `elem` with size bounds. Swapped bounds reorder; the
    /// fully unconstrained form collapses to the default array type.
    pub fn array_sized(elem: Type, min: usize, max: usize) -> Type {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        if min == 0 && max == UNBOUNDED && matches!(elem.kind(), TypeKind::Any) {
            return Type::array();
        }
        Type::intern(TypeKind::ArraySized { elem, min, max })
    }

    /// The tuple of the given position types. An empty list yields the
    /// empty tuple, which matches only the empty array.
    pub fn tuple_of(types: Vec<Type>) -> Type {
        if types.is_empty() {
            return EMPTY_TUPLE.clone();
        }
        Type::intern(TypeKind::Tuple {
            types,
            variadic: false,
        })
    }

    /// A tuple whose last type is array-kind and governs all positions
    /// past the fixed prefix.
    pub fn variadic_tuple(types: Vec<Type>) -> Result<Type> {
        let Some(last) = types.last() else {
            return Err(error::illegal_argument(
                "a variadic tuple must have at least one element",
            ));
        };
        if !matches!(last.kind(), TypeKind::Array | TypeKind::ArraySized { .. }) {
            return Err(error::illegal_argument(
                "the last element of a variadic tuple must be an array type",
            ));
        }
        Ok(Type::intern(TypeKind::Tuple {
            types,
            variadic: true,
        }))
    }

    /// The unconstrained map type.
    pub fn map() -> Type {
        MAP.clone()
    }

    /// Maps from `key` to `value`, any size.
    pub fn map_of(key: Type, value: Type) -> Type {
        Type::map_sized(key, value, 0, UNBOUNDED)
    }

    /// Maps with key/value types and size bounds.
    pub fn map_sized(key: Type, value: Type, min: usize, max: usize) -> Type {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        if min == 0
            && max == UNBOUNDED
            && matches!(key.kind(), TypeKind::Any)
            && matches!(value.kind(), TypeKind::Any)
        {
            return Type::map();
        }
        Type::intern(TypeKind::MapSized {
            key,
            value,
            min,
            max,
        })
    }

    /// A struct-map type. Entry keys must be exact strings and unique.
    pub fn struct_map(entries: Vec<StructMapEntry>, additional: bool) -> Result<Type> {
        let mut seen: Vec<&str> = Vec::with_capacity(entries.len());
        for entry in &entries {
            let TypeKind::Exact(Value::String(key)) = entry.key.kind() else {
                return Err(error::illegal_argument(
                    "struct map entry keys must be exact strings",
                ));
            };
            if seen.contains(&key.as_str()) {
                return Err(error::illegal_argument(format!(
                    "duplicate struct map key {key}"
                )));
            }
            seen.push(key.as_str());
        }
        Ok(Type::intern(TypeKind::StructMap {
            entries,
            additional,
        }))
    }

    /// The conjunction of `types`. Flattens nested conjunctions,
    /// deduplicates, and collapses the empty and singleton forms.
    pub fn all_of(types: Vec<Type>) -> Type {
        let mut flat = Vec::with_capacity(types.len());
        flatten_into(&mut flat, types, |k| match k {
            TypeKind::AllOf(ts) => Some(ts),
            _ => None,
        });
        match flat.len() {
            0 => Type::any(),
            1 => flat.into_iter().next().expect("length checked"),
            _ => Type::intern(TypeKind::AllOf(flat)),
        }
    }

    /// The disjunction of `types`. The empty disjunction matches
    /// nothing.
    pub fn any_of(types: Vec<Type>) -> Type {
        let mut flat = Vec::with_capacity(types.len());
        flatten_into(&mut flat, types, |k| match k {
            TypeKind::AnyOf(ts) => Some(ts),
            _ => None,
        });
        match flat.len() {
            1 => flat.into_iter().next().expect("length checked"),
            _ => Type::intern(TypeKind::AnyOf(flat)),
        }
    }

    /// The exclusive disjunction of `types`: matches when exactly one
    /// member matches. Only structurally equal duplicates are removed.
    pub fn one_of(types: Vec<Type>) -> Type {
        let mut flat = Vec::with_capacity(types.len());
        flatten_into(&mut flat, types, |k| match k {
            TypeKind::OneOf(ts) => Some(ts),
            _ => None,
        });
        match flat.len() {
            1 => flat.into_iter().next().expect("length checked"),
            _ => Type::intern(TypeKind::OneOf(flat)),
        }
    }

    /// The complement of `t`.
    pub fn not(t: Type) -> Type {
        Type::intern(TypeKind::Not(t))
    }

    /// The exact type backed by `value`.
    ///
    /// Nil and the booleans normalize to their singleton types; a type
    /// value normalizes to its meta type.
    pub fn exact(value: Value) -> Type {
        match value {
            Value::Nil => Type::nil(),
            Value::Boolean(true) => Type::true_type(),
            Value::Boolean(false) => Type::false_type(),
            Value::Type(t) => Type::meta(t),
            other => Type::intern(TypeKind::Exact(other)),
        }
    }

    /// The meta type of `t`.
    pub fn meta(t: Type) -> Type {
        Type::intern(TypeKind::Meta(Some(t)))
    }

    /// The type of meta types: the fixed point of `type_of`.
    pub fn meta_type() -> Type {
        META.clone()
    }

    /// A type matching the host type `T`, outside the type language.
    pub fn native<T: 'static>() -> Type {
        Type::intern(TypeKind::Native {
            id: std::any::TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        })
    }

    /// An unbound named placeholder, to be bound by alias resolution.
    pub fn alias(name: impl Into<Str>) -> Type {
        Type::intern(TypeKind::Alias(AliasData::new(name.into())))
    }
}

fn flatten_into(
    out: &mut Vec<Type>,
    types: Vec<Type>,
    same_kind: impl Fn(&TypeKind) -> Option<&Vec<Type>> + Copy,
) {
    for t in types {
        if let Some(nested) = same_kind(t.kind()) {
            flatten_into(out, nested.clone(), same_kind);
        } else if !out.contains(&t) {
            out.push(t);
        }
    }
}

// Queries

impl Type {
    /// True when every value of `other` is also an instance of `self`.
    pub fn assignable(&self, other: &Type) -> bool {
        assignable::assignable(&mut RecursionGuard::default(), self, other)
    }

    /// True when `value` belongs to this type.
    pub fn instance(&self, value: &Value) -> bool {
        assignable::instance(&mut RecursionGuard::default(), self, value)
    }

    /// The identifier tag of this type.
    pub fn type_identifier(&self) -> TypeIdentifier {
        match self.kind() {
            TypeKind::Any => TypeIdentifier::Any,
            TypeKind::Nil => TypeIdentifier::Nil,
            TypeKind::Boolean => TypeIdentifier::Boolean,
            TypeKind::True => TypeIdentifier::True,
            TypeKind::False => TypeIdentifier::False,
            TypeKind::Integer => TypeIdentifier::Integer,
            TypeKind::IntegerRange { .. } => TypeIdentifier::IntegerRange,
            TypeKind::Float => TypeIdentifier::Float,
            TypeKind::FloatRange { .. } => TypeIdentifier::FloatRange,
            TypeKind::String => TypeIdentifier::String,
            TypeKind::StringSized { .. } => TypeIdentifier::StringSized,
            TypeKind::StringPattern(_) => TypeIdentifier::StringPattern,
            TypeKind::Ci(_) => TypeIdentifier::Ci,
            TypeKind::Binary => TypeIdentifier::Binary,
            TypeKind::Array => TypeIdentifier::Array,
            TypeKind::ArraySized { .. } => TypeIdentifier::Array,
            TypeKind::Tuple { .. } => TypeIdentifier::Tuple,
            TypeKind::Map => TypeIdentifier::Map,
            TypeKind::MapSized { .. } => TypeIdentifier::Map,
            TypeKind::StructMap { .. } => TypeIdentifier::StructMap,
            TypeKind::AllOf(_) => TypeIdentifier::AllOf,
            TypeKind::AnyOf(_) => TypeIdentifier::AnyOf,
            TypeKind::OneOf(_) => TypeIdentifier::OneOf,
            TypeKind::Not(_) => TypeIdentifier::Not,
            TypeKind::Meta(_) => TypeIdentifier::Meta,
            TypeKind::Native { .. } => TypeIdentifier::Native,
            TypeKind::Alias(_) => match follow_alias(self) {
                Some(t) => t.type_identifier(),
                None => TypeIdentifier::Alias,
            },
            TypeKind::Exact(v) => match v {
                Value::Integer(_) => TypeIdentifier::IntegerExact,
                Value::Float(_) => TypeIdentifier::FloatExact,
                Value::String(_) => TypeIdentifier::StringExact,
                Value::Binary(_) => TypeIdentifier::BinaryExact,
                Value::Array(_) => TypeIdentifier::ArrayExact,
                Value::Map(_) => TypeIdentifier::MapExact,
                Value::Entry(_) => TypeIdentifier::MapEntryExact,
                // Normalized away by `Type::exact`.
                Value::Nil => TypeIdentifier::Nil,
                Value::Boolean(true) => TypeIdentifier::True,
                Value::Boolean(false) => TypeIdentifier::False,
                Value::Type(_) => TypeIdentifier::Meta,
            },
        }
    }

    /// The type of this type: a meta type. The meta chain is cut short
    /// at the meta-of-meta fixed point.
    pub fn type_of(&self) -> Type {
        match self.kind() {
            TypeKind::Meta(_) => Type::meta_type(),
            _ => Type::meta(self.clone()),
        }
    }

    /// The structural form of an exact type, stripped of value identity
    /// and size constraints. Non-exact types return themselves.
    pub fn generic(&self) -> Type {
        match self.kind() {
            TypeKind::Exact(v) => match v {
                Value::Integer(_) => Type::integer(),
                Value::Float(_) => Type::float(),
                Value::String(_) => Type::string(),
                Value::Binary(_) => Type::binary(),
                Value::Array(a) => {
                    let elem = generic_union(a.values().iter().map(Value::type_of));
                    Type::array_sized(elem, 0, UNBOUNDED)
                }
                Value::Map(m) => {
                    let pairs = m.snapshot();
                    let key = generic_union(pairs.iter().map(|(k, _)| k.type_of()));
                    let value = generic_union(pairs.iter().map(|(_, v)| v.type_of()));
                    Type::map_sized(key, value, 0, UNBOUNDED)
                }
                _ => self.clone(),
            },
            TypeKind::Alias(_) => match follow_alias(self) {
                Some(t) => t.generic(),
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }
}

/// The deduplicated union of the generic forms of `types`; Any when
/// empty, the single member when unique.
fn generic_union(types: impl Iterator<Item = Type>) -> Type {
    let mut out: Vec<Type> = Vec::new();
    for t in types {
        let g = t.generic();
        if !out.contains(&g) {
            out.push(g);
        }
    }
    match out.len() {
        0 => Type::any(),
        1 => out.into_iter().next().expect("length checked"),
        _ => Type::any_of(out),
    }
}

// Helpers shared with the engine and the collections.

/// Follow an alias chain to its first structural target. `None` when
/// the chain is unbound or degenerately closes on itself without ever
/// reaching a structural type.
pub(crate) fn follow_alias(t: &Type) -> Option<Type> {
    let mut seen = vec![t.ptr_id()];
    let mut current = t.clone();
    loop {
        let TypeKind::Alias(a) = current.kind() else {
            return Some(current);
        };
        let next = a.resolved()?;
        if seen.contains(&next.ptr_id()) {
            return None;
        }
        seen.push(next.ptr_id());
        current = next;
    }
}

/// Bounds implied by an array-kind type.
pub(crate) fn array_kind_bounds(kind: &TypeKind) -> Option<(usize, usize)> {
    match kind {
        TypeKind::Array => Some((0, UNBOUNDED)),
        TypeKind::ArraySized { min, max, .. } => Some((*min, *max)),
        TypeKind::Tuple { types, variadic } => Some(tuple_bounds(types, *variadic)),
        _ => None,
    }
}

/// Min/max length admitted by a tuple: the fixed prefix width plus the
/// variadic tail's bounds.
pub(crate) fn tuple_bounds(types: &[Type], variadic: bool) -> (usize, usize) {
    if !variadic {
        return (types.len(), types.len());
    }
    let fixed = types.len() - 1;
    let (tail_min, tail_max) = array_kind_bounds(types[fixed].kind()).unwrap_or((0, UNBOUNDED));
    let max = if tail_max == UNBOUNDED {
        UNBOUNDED
    } else {
        fixed.saturating_add(tail_max)
    };
    (fixed.saturating_add(tail_min), max)
}

/// The element type governing position `i` of a tuple, extended past
/// the fixed prefix by the variadic tail. `None` when `i` is out of
/// range for a fixed tuple.
pub(crate) fn tuple_pos_type(types: &[Type], variadic: bool, i: usize) -> Option<Type> {
    if variadic {
        let fixed = types.len() - 1;
        if i < fixed {
            Some(types[i].clone())
        } else {
            Some(element_type(&types[fixed]))
        }
    } else {
        types.get(i).cloned()
    }
}

/// Bounds implied by a map-kind type. A struct map admits at least its
/// required entries and, unless it is open, at most its declared ones.
pub(crate) fn map_kind_bounds(kind: &TypeKind) -> Option<(usize, usize)> {
    match kind {
        TypeKind::Map => Some((0, UNBOUNDED)),
        TypeKind::MapSized { min, max, .. } => Some((*min, *max)),
        TypeKind::StructMap {
            entries,
            additional,
        } => {
            let required = entries.iter().filter(|e| e.required()).count();
            let max = if *additional {
                UNBOUNDED
            } else {
                entries.len()
            };
            Some((required, max))
        }
        _ => None,
    }
}

/// The element type of an array-kind type; Any for the default array.
pub(crate) fn element_type(t: &Type) -> Type {
    match t.kind() {
        TypeKind::ArraySized { elem, .. } => elem.clone(),
        _ => Type::any(),
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        deep::type_equals(&mut RecursionGuard::default(), self, other)
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(deep::type_hash(&mut Seen::default(), self));
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Any => f.write_str("any"),
            TypeKind::Nil => f.write_str("nil"),
            TypeKind::Boolean => f.write_str("bool"),
            TypeKind::True => f.write_str("true"),
            TypeKind::False => f.write_str("false"),
            TypeKind::Integer => f.write_str("int"),
            TypeKind::IntegerRange {
                min,
                max,
                inclusive,
            } => {
                if *inclusive {
                    write!(f, "int[{min}..={max}]")
                } else {
                    write!(f, "int[{min}..{max}]")
                }
            }
            TypeKind::Float => f.write_str("float"),
            TypeKind::FloatRange {
                min,
                max,
                inclusive,
            } => {
                if *inclusive {
                    write!(f, "float[{min}..={max}]")
                } else {
                    write!(f, "float[{min}..{max}]")
                }
            }
            TypeKind::String => f.write_str("string"),
            TypeKind::StringSized { min, max } => {
                f.write_str("string[")?;
                write_bounds(f, *min, *max)?;
                f.write_str("]")
            }
            TypeKind::StringPattern(re) => write!(f, "/{}/", re.as_str()),
            TypeKind::Ci(s) => write!(f, "~{:?}", s.as_str()),
            TypeKind::Binary => f.write_str("binary"),
            TypeKind::Array => f.write_str("[any]"),
            TypeKind::ArraySized { elem, min, max } => {
                if *min == 0 && *max == UNBOUNDED {
                    write!(f, "[{elem}]")
                } else {
                    write!(f, "[{elem}; ")?;
                    write_bounds(f, *min, *max)?;
                    f.write_str("]")
                }
            }
            TypeKind::Tuple { types, variadic } => {
                f.write_str("(")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if *variadic && i == types.len() - 1 {
                        f.write_str("...")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str(")")
            }
            TypeKind::Map => f.write_str("{any: any}"),
            TypeKind::MapSized {
                key,
                value,
                min,
                max,
            } => {
                if *min == 0 && *max == UNBOUNDED {
                    write!(f, "{{{key}: {value}}}")
                } else {
                    write!(f, "{{{key}: {value}; ")?;
                    write_bounds(f, *min, *max)?;
                    f.write_str("}")
                }
            }
            TypeKind::StructMap {
                entries,
                additional,
            } => {
                f.write_str("{")?;
                for (i, e) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match e.key.kind() {
                        TypeKind::Exact(Value::String(s)) => write!(f, "{s}")?,
                        _ => write!(f, "{}", e.key)?,
                    }
                    if !e.required {
                        f.write_str("?")?;
                    }
                    write!(f, ": {}", e.value)?;
                }
                if *additional {
                    if !entries.is_empty() {
                        f.write_str(", ")?;
                    }
                    f.write_str("...")?;
                }
                f.write_str("}")
            }
            TypeKind::AllOf(ts) => write_joined(f, ts, " & "),
            TypeKind::AnyOf(ts) => {
                if ts.is_empty() {
                    f.write_str("never")
                } else {
                    write_joined(f, ts, " | ")
                }
            }
            TypeKind::OneOf(ts) => write_joined(f, ts, " ^ "),
            TypeKind::Not(t) => write!(f, "!{t}"),
            TypeKind::Exact(v) => write!(f, "{v}"),
            TypeKind::Meta(Some(t)) => write!(f, "type[{t}]"),
            TypeKind::Meta(None) => f.write_str("type"),
            TypeKind::Native { name, .. } => write!(f, "native[{name}]"),
            TypeKind::Alias(a) => write!(f, "{}", a.name()),
        }
    }
}

fn write_bounds(f: &mut fmt::Formatter<'_>, min: usize, max: usize) -> fmt::Result {
    if max == UNBOUNDED {
        write!(f, "{min}..")
    } else {
        write!(f, "{min}..={max}")
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[Type], sep: &str) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}
