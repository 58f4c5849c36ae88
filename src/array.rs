//! The array collection.
//!
//! An ordered sequence of values with an optional declared type.
//! Mutations are checked against the declared type (size bounds first,
//! then the element type for the affected position) and fail fast on a
//! frozen array. `freeze` is one-way and recursive.
//!
//! Locks are never held while calling back into arbitrary values: every
//! deep operation snapshots the spine first, so user callbacks and
//! cyclic structures cannot deadlock against the array's own lock.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{self, Result};
use crate::guard::RecursionGuard;
use crate::map::Map;
use crate::ty::{self, Type, TypeKind};
use crate::value::Value;

struct ArrayData {
    elems: Vec<Value>,
    typ: Option<Type>,
    frozen: bool,
}

/// An ordered, optionally typed, freezable sequence of values.
#[derive(Clone)]
pub struct Array(Arc<RwLock<ArrayData>>);

impl Array {
    /// An empty, untyped, mutable array.
    pub fn new() -> Array {
        Array::from_values(Vec::new())
    }

    /// An empty mutable array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Array {
        Array::from_values(Vec::with_capacity(capacity))
    }

    /// A mutable, untyped array owning `values`.
    pub fn from_values(values: Vec<Value>) -> Array {
        Array(Arc::new(RwLock::new(ArrayData {
            elems: values,
            typ: None,
            frozen: false,
        })))
    }

    /// A frozen array holding deep-frozen copies of `values`.
    pub fn frozen_from_values(values: Vec<Value>) -> Result<Array> {
        let elems = values
            .into_iter()
            .map(|v| v.frozen_copy())
            .collect::<Result<Vec<_>>>()?;
        Ok(Array(Arc::new(RwLock::new(ArrayData {
            elems,
            typ: None,
            frozen: true,
        }))))
    }

    /// A mutable array carrying a declared type. The values must
    /// already satisfy the type.
    pub fn typed(typ: Type, values: Vec<Value>) -> Result<Array> {
        let arr = Array::from_values(values);
        arr.set_type(Some(typ))?;
        Ok(arr)
    }

    pub(crate) fn from_parts(elems: Vec<Value>, typ: Option<Type>, frozen: bool) -> Array {
        Array(Arc::new(RwLock::new(ArrayData { elems, typ, frozen })))
    }

    pub fn len(&self) -> usize {
        self.0.read().elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().elems.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    /// The declared type, when one is set.
    pub fn declared_type(&self) -> Option<Type> {
        self.0.read().typ.clone()
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().elems.get(index).cloned()
    }

    /// A snapshot of the elements.
    pub fn values(&self) -> Vec<Value> {
        self.0.read().elems.clone()
    }

    /// Iterate over a snapshot of the elements.
    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.values().into_iter()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// The type of this array: the declared type when set, else the
    /// exact type backed by the array itself.
    pub fn type_of(&self) -> Type {
        match self.declared_type() {
            Some(t) => t,
            None => Type::exact(Value::Array(self.clone())),
        }
    }

    /// Declare (or clear) the constraint type. The current contents
    /// must satisfy the new type.
    pub fn set_type(&self, typ: Option<Type>) -> Result<()> {
        if self.is_frozen() {
            return Err(error::frozen("Array", "set_type"));
        }
        let Some(t) = typ else {
            self.0.write().typ = None;
            return Ok(());
        };
        // Aliases are stored resolved so element checks see the
        // structural type.
        let t = ty::follow_alias(&t).unwrap_or(t);
        if ty::array_kind_bounds(t.kind()).is_none() {
            return Err(error::type_assertion(format!(
                "{t} is not an array type"
            )));
        }
        if !t.instance(&Value::Array(self.clone())) {
            let n = self.len();
            let (min, max) = ty::array_kind_bounds(t.kind()).expect("checked array kind");
            if n < min || n > max {
                return Err(error::illegal_size(&t, n));
            }
            return Err(error::illegal_assignment(&t, &Value::Array(self.clone())));
        }
        tracing::debug!(%t, "array type declared");
        self.0.write().typ = Some(t);
        Ok(())
    }
}

// Mutation

impl Array {
    /// Append a value.
    pub fn add(&self, value: Value) -> Result<()> {
        let len = self.len();
        self.check_frozen("add")?;
        self.assert_element(&value, len)?;
        self.0.write().elems.push(value);
        Ok(())
    }

    /// Append every value of `values`, checking sizes up front.
    pub fn add_all<I: IntoIterator<Item = Value>>(&self, values: I) -> Result<()> {
        let incoming: Vec<Value> = values.into_iter().collect();
        self.check_frozen("add_all")?;
        self.assert_addition(&incoming)?;
        self.0.write().elems.extend(incoming);
        Ok(())
    }

    /// Insert `value` at `position`, shifting later elements.
    ///
    /// # Panics
    ///
    /// Panics when `position > len`.
    pub fn insert(&self, position: usize, value: Value) -> Result<()> {
        self.check_frozen("insert")?;
        self.assert_element(&value, position)?;
        self.0.write().elems.insert(position, value);
        Ok(())
    }

    /// Replace the element at `position`, returning the old value.
    ///
    /// # Panics
    ///
    /// Panics when `position >= len`.
    pub fn set(&self, position: usize, value: Value) -> Result<Value> {
        self.check_frozen("set")?;
        self.assert_element(&value, position)?;
        let mut data = self.0.write();
        let old = std::mem::replace(&mut data.elems[position], value);
        Ok(old)
    }

    /// Remove and return the element at `position`, or `None` when out
    /// of range.
    pub fn remove(&self, position: usize) -> Result<Option<Value>> {
        self.check_frozen("remove")?;
        if position >= self.len() {
            return Ok(None);
        }
        self.assert_removal()?;
        let mut data = self.0.write();
        if position >= data.elems.len() {
            return Ok(None);
        }
        Ok(Some(data.elems.remove(position)))
    }

    /// Remove the first element equal to `value`; reports whether one
    /// was removed.
    pub fn remove_value(&self, value: &Value) -> Result<bool> {
        self.check_frozen("remove_value")?;
        match self.index_of(value) {
            Some(i) => {
                self.assert_removal()?;
                self.0.write().elems.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Result<Option<Value>> {
        self.check_frozen("pop")?;
        if self.is_empty() {
            return Ok(None);
        }
        self.assert_removal()?;
        Ok(self.0.write().elems.pop())
    }

    fn check_frozen(&self, op: &'static str) -> Result<()> {
        if self.is_frozen() {
            return Err(error::frozen("Array", op));
        }
        Ok(())
    }

    /// Size and element-type check for a single value landing at
    /// `position`. Tuple-typed arrays check the position-specific type,
    /// with the variadic tail governing positions past the prefix.
    fn assert_element(&self, value: &Value, position: usize) -> Result<()> {
        let Some(t) = self.declared_type() else {
            return Ok(());
        };
        let len = self.len();
        if position >= len {
            let (_, max) = ty::array_kind_bounds(t.kind()).expect("declared type is array-kind");
            if len + 1 > max {
                return Err(error::illegal_size(&t, len + 1));
            }
        }
        let et = match t.kind() {
            TypeKind::Tuple { types, variadic } => ty::tuple_pos_type(types, *variadic, position)
                .ok_or_else(|| error::illegal_size(&t, position + 1))?,
            _ => ty::element_type(&t),
        };
        if !et.instance(value) {
            return Err(error::illegal_assignment(&et, value));
        }
        Ok(())
    }

    fn assert_addition(&self, values: &[Value]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let Some(t) = self.declared_type() else {
            return Ok(());
        };
        let len = self.len();
        let (_, max) = ty::array_kind_bounds(t.kind()).expect("declared type is array-kind");
        if len + values.len() > max {
            return Err(error::illegal_size(&t, len + values.len()));
        }
        for (i, v) in values.iter().enumerate() {
            self.assert_element(v, len + i)?;
        }
        Ok(())
    }

    fn assert_removal(&self) -> Result<()> {
        let Some(t) = self.declared_type() else {
            return Ok(());
        };
        let len = self.len();
        let (min, _) = ty::array_kind_bounds(t.kind()).expect("declared type is array-kind");
        if len == 0 || len - 1 < min {
            return Err(error::illegal_size(&t, len.saturating_sub(1)));
        }
        Ok(())
    }
}

// Freezing and copying

impl Array {
    /// Freeze this array and, recursively, its elements. One-way.
    ///
    /// The flag is set before descending, so self-referential arrays
    /// terminate.
    pub fn freeze(&self) -> Result<()> {
        let elems = {
            let mut data = self.0.write();
            if data.frozen {
                return Ok(());
            }
            data.frozen = true;
            data.elems.clone()
        };
        for e in &elems {
            e.freeze()?;
        }
        Ok(())
    }

    /// A deep-frozen copy. Returns the receiver when already frozen.
    pub fn frozen_copy(&self) -> Result<Array> {
        self.copy(true)
    }

    /// A shallow copy of the spine. With `frozen`, elements are
    /// replaced by their deep-frozen copies and the result is frozen.
    pub fn copy(&self, frozen: bool) -> Result<Array> {
        if frozen && self.is_frozen() {
            return Ok(self.clone());
        }
        let (mut elems, typ) = {
            let data = self.0.read();
            (data.elems.clone(), data.typ.clone())
        };
        if frozen {
            for e in &mut elems {
                *e = e.frozen_copy()?;
            }
        }
        Ok(Array::from_parts(elems, typ, frozen))
    }
}

// Non-mutating builders

impl Array {
    /// A new array with `value` appended, preserving the declared type
    /// and frozen-ness.
    pub fn with(&self, value: Value) -> Result<Array> {
        self.assert_element(&value, self.len())?;
        let (mut elems, typ, frozen) = self.parts();
        elems.push(if frozen { value.frozen_copy()? } else { value });
        Ok(Array::from_parts(elems, typ, frozen))
    }

    /// A new array with every value of `values` appended.
    pub fn with_all<I: IntoIterator<Item = Value>>(&self, values: I) -> Result<Array> {
        let incoming: Vec<Value> = values.into_iter().collect();
        if incoming.is_empty() {
            return Ok(self.clone());
        }
        self.assert_addition(&incoming)?;
        let (mut elems, typ, frozen) = self.parts();
        for v in incoming {
            elems.push(if frozen { v.frozen_copy()? } else { v });
        }
        Ok(Array::from_parts(elems, typ, frozen))
    }

    fn parts(&self) -> (Vec<Value>, Option<Type>, bool) {
        let data = self.0.read();
        (data.elems.clone(), data.typ.clone(), data.frozen)
    }
}

// Queries and transformations

impl Array {
    /// A sub-array of positions `start..end`, untyped.
    ///
    /// # Panics
    ///
    /// Panics when the range is out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Array {
        let data = self.0.read();
        Array::from_parts(data.elems[start..end].to_vec(), None, data.frozen)
    }

    /// The position of the first element equal to `value`.
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.values().iter().position(|e| e == value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.index_of(value).is_some()
    }

    /// True when every element of `other` has an equal counterpart
    /// here, respecting multiplicity.
    pub fn contains_all(&self, other: &Array) -> bool {
        let elems = self.values();
        let others = other.values();
        if elems.len() < others.len() {
            return false;
        }
        let mut unclaimed: Vec<Option<&Value>> = elems.iter().map(Some).collect();
        for want in &others {
            let found = unclaimed.iter_mut().find(|slot| match slot {
                Some(e) => *e == want,
                None => false,
            });
            match found {
                Some(slot) => *slot = None,
                None => return false,
            }
        }
        true
    }

    /// True when the two arrays hold equal values, in any order.
    pub fn same_values(&self, other: &Array) -> bool {
        self.len() == other.len() && self.contains_all(other)
    }

    /// Apply `f` to every element; the result is untyped.
    pub fn map(&self, mut f: impl FnMut(&Value) -> Value) -> Array {
        let elems = self.values().iter().map(|e| f(e)).collect();
        Array::from_parts(elems, None, self.is_frozen())
    }

    /// Apply `f` to every element and declare the result of type
    /// `typ`, enforcing its size and element constraints.
    pub fn map_to(&self, typ: &Type, mut f: impl FnMut(&Value) -> Value) -> Result<Array> {
        let elems = self.values();
        let (min, max) = ty::array_kind_bounds(typ.kind())
            .ok_or_else(|| error::type_assertion(format!("{typ} is not an array type")))?;
        if elems.len() < min || elems.len() > max {
            return Err(error::illegal_size(typ, elems.len()));
        }
        let mut out = Vec::with_capacity(elems.len());
        for (i, e) in elems.iter().enumerate() {
            let mapped = f(e);
            let et = match typ.kind() {
                TypeKind::Tuple { types, variadic } => ty::tuple_pos_type(types, *variadic, i)
                    .ok_or_else(|| error::illegal_size(typ, i + 1))?,
                _ => ty::element_type(typ),
            };
            if !et.instance(&mapped) {
                return Err(error::illegal_assignment(&et, &mapped));
            }
            out.push(mapped);
        }
        Ok(Array::from_parts(out, Some(typ.clone()), self.is_frozen()))
    }

    /// The elements satisfying `predicate`, preserving the declared
    /// type.
    pub fn select(&self, mut predicate: impl FnMut(&Value) -> bool) -> Array {
        let (elems, typ, frozen) = self.parts();
        let kept = elems.into_iter().filter(|e| predicate(e)).collect();
        Array::from_parts(kept, typ, frozen)
    }

    /// The elements not satisfying `predicate`.
    pub fn reject(&self, mut predicate: impl FnMut(&Value) -> bool) -> Array {
        self.select(|e| !predicate(e))
    }

    /// Fold the elements onto `memo`.
    pub fn reduce(&self, memo: Value, mut f: impl FnMut(Value, &Value) -> Value) -> Value {
        let mut acc = memo;
        for e in self.values() {
            acc = f(acc, &e);
        }
        acc
    }

    /// The first non-`None` result of `f`.
    pub fn find_map(&self, mut f: impl FnMut(&Value) -> Option<Value>) -> Option<Value> {
        self.values().iter().find_map(|e| f(e))
    }

    pub fn all(&self, mut predicate: impl FnMut(&Value) -> bool) -> bool {
        self.values().iter().all(|e| predicate(e))
    }

    pub fn any(&self, mut predicate: impl FnMut(&Value) -> bool) -> bool {
        self.values().iter().any(|e| predicate(e))
    }

    /// True when exactly one element satisfies `predicate`.
    pub fn one(&self, mut predicate: impl FnMut(&Value) -> bool) -> bool {
        let mut found = false;
        for e in self.values() {
            if predicate(&e) {
                if found {
                    return false;
                }
                found = true;
            }
        }
        found
    }

    pub fn each(&self, mut f: impl FnMut(&Value)) {
        for e in self.values() {
            f(&e);
        }
    }

    pub fn each_with_index(&self, mut f: impl FnMut(&Value, usize)) {
        for (i, e) in self.values().iter().enumerate() {
            f(e, i);
        }
    }

    /// The distinct elements, first occurrence winning, preserving the
    /// declared type.
    pub fn unique(&self) -> Array {
        let (elems, typ, frozen) = self.parts();
        if elems.len() < 2 {
            return self.clone();
        }
        let mut buckets: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
        let mut out: Vec<Value> = Vec::with_capacity(elems.len());
        for e in elems {
            let h = e.hash_code();
            let seen = buckets.entry(h).or_default();
            if seen.iter().any(|&i| out[i] == e) {
                continue;
            }
            seen.push(out.len());
            out.push(e);
        }
        Array::from_parts(out, typ, frozen)
    }

    /// A stably sorted copy. Elements order by `compare_to`; elements
    /// with no mutual order keep their relative position by type
    /// identifier.
    pub fn sort(&self) -> Array {
        let (mut elems, typ, frozen) = self.parts();
        if elems.len() < 2 {
            return self.clone();
        }
        elems.sort_by(|a, b| {
            let mut guard = RecursionGuard::default();
            match crate::deep::value_compare(&mut guard, a, b) {
                Some(ord) => ord,
                None => a.type_identifier().cmp(&b.type_identifier()),
            }
        });
        Array::from_parts(elems, typ, frozen)
    }

    /// Recursively flatten nested arrays into a single sequence. The
    /// result is untyped.
    pub fn flatten(&self) -> Array {
        fn flatten_into(out: &mut Vec<Value>, elems: &[Value]) {
            for e in elems {
                match e {
                    Value::Array(a) => flatten_into(out, &a.values()),
                    other => out.push(other.clone()),
                }
            }
        }
        let elems = self.values();
        if !elems.iter().any(|e| matches!(e, Value::Array(_))) {
            return self.clone();
        }
        let mut out = Vec::with_capacity(elems.len() * 2);
        flatten_into(&mut out, &elems);
        Array::from_parts(out, None, self.is_frozen())
    }

    /// Interpret the elements as alternating keys and values. An odd
    /// count leaves the last key mapped to nil.
    pub fn to_map(&self) -> Map {
        let elems = self.values();
        let mut pairs = Vec::with_capacity(elems.len().div_ceil(2));
        let mut iter = elems.into_iter();
        while let Some(k) = iter.next() {
            let v = iter.next().unwrap_or(Value::Nil);
            pairs.push((k, v));
        }
        Map::from_parts(pairs, self.is_frozen())
    }

    /// Interpret every element as an entry or a two-element array and
    /// build a map. `None` when an element has neither shape.
    pub fn to_map_from_entries(&self) -> Option<Map> {
        let elems = self.values();
        let mut pairs = Vec::with_capacity(elems.len());
        for e in &elems {
            match e {
                Value::Entry(entry) => {
                    pairs.push((entry.key().clone(), entry.value().clone()));
                }
                Value::Array(a) if a.len() == 2 => {
                    let vs = a.values();
                    pairs.push((vs[0].clone(), vs[1].clone()));
                }
                _ => return None,
            }
        }
        Some(Map::from_parts(pairs, self.is_frozen()))
    }
}

impl Default for Array {
    fn default() -> Self {
        Array::new()
    }
}

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Array::from_values(values)
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::from_values(iter.into_iter().collect())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        crate::deep::value_equals(
            &mut RecursionGuard::default(),
            &Value::Array(self.clone()),
            &Value::Array(other.clone()),
        )
    }
}

impl Eq for Array {}

impl PartialOrd for Array {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        crate::deep::value_compare(
            &mut RecursionGuard::default(),
            &Value::Array(self.clone()),
            &Value::Array(other.clone()),
        )
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, e) in self.values().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array({self})")
    }
}

#[cfg(test)]
mod tests;
