//! The map collection.
//!
//! An insertion-ordered hash map. Nodes live in an index arena; each
//! node is threaded onto two lists at once: a per-bucket hash chain
//! (`hash_next`) and a doubly-linked insertion list (`prev`/`next`).
//! The bucket table is always a power of two and grows when the entry
//! count passes three quarters of it.
//!
//! Keys are stored as deep-frozen copies so that no later mutation can
//! corrupt the table. Iteration order is insertion order; equality and
//! hashing are order-independent.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{self, Result};
use crate::guard::RecursionGuard;
use crate::ty::{self, Type, TypeKind};
use crate::value::Value;

const NIL_IDX: u32 = u32::MAX;

struct Node {
    key: Value,
    value: Value,
    hash: u64,
    hash_next: u32,
    prev: u32,
    next: u32,
}

struct MapData {
    nodes: Vec<Node>,
    free: Vec<u32>,
    table: Vec<u32>,
    head: u32,
    tail: u32,
    len: usize,
    typ: Option<Type>,
    frozen: bool,
}

/// The bucket table size for an expected entry count: the next power
/// of two past four thirds of it.
fn table_size_for(expected: usize) -> usize {
    (expected.saturating_mul(4) / 3 + 1).next_power_of_two().max(4)
}

impl MapData {
    fn with_capacity(capacity: usize) -> MapData {
        MapData {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            table: vec![NIL_IDX; table_size_for(capacity)],
            head: NIL_IDX,
            tail: NIL_IDX,
            len: 0,
            typ: None,
            frozen: false,
        }
    }

    #[inline]
    fn bucket(&self, hash: u64) -> usize {
        (hash as usize) & (self.table.len() - 1)
    }

    fn find(&self, key: &Value, hash: u64) -> Option<u32> {
        let mut idx = self.table[self.bucket(hash)];
        while idx != NIL_IDX {
            let node = &self.nodes[idx as usize];
            if node.hash == hash && &node.key == key {
                return Some(idx);
            }
            idx = node.hash_next;
        }
        None
    }

    /// Append a node not currently present. Grows the table first when
    /// the load factor would be exceeded.
    fn insert_tail(&mut self, key: Value, value: Value, hash: u64) {
        if self.len + 1 > self.table.len() * 3 / 4 {
            self.grow();
        }
        let idx = match self.free.pop() {
            Some(i) => i,
            None => {
                self.nodes.push(Node {
                    key: Value::Nil,
                    value: Value::Nil,
                    hash: 0,
                    hash_next: NIL_IDX,
                    prev: NIL_IDX,
                    next: NIL_IDX,
                });
                (self.nodes.len() - 1) as u32
            }
        };
        let bucket = self.bucket(hash);
        let tail = self.tail;
        {
            let node = &mut self.nodes[idx as usize];
            node.key = key;
            node.value = value;
            node.hash = hash;
            node.hash_next = self.table[bucket];
            node.prev = tail;
            node.next = NIL_IDX;
        }
        self.table[bucket] = idx;
        if self.head == NIL_IDX {
            self.head = idx;
        } else {
            self.nodes[tail as usize].next = idx;
        }
        self.tail = idx;
        self.len += 1;
    }

    fn unlink(&mut self, idx: u32) -> Value {
        let (prev, next, hash) = {
            let node = &self.nodes[idx as usize];
            (node.prev, node.next, node.hash)
        };
        if prev == NIL_IDX {
            self.head = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NIL_IDX {
            self.tail = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }
        let bucket = self.bucket(hash);
        if self.table[bucket] == idx {
            self.table[bucket] = self.nodes[idx as usize].hash_next;
        } else {
            let mut walk = self.table[bucket];
            while self.nodes[walk as usize].hash_next != idx {
                walk = self.nodes[walk as usize].hash_next;
            }
            self.nodes[walk as usize].hash_next = self.nodes[idx as usize].hash_next;
        }
        let node = &mut self.nodes[idx as usize];
        node.key = Value::Nil;
        let old = std::mem::replace(&mut node.value, Value::Nil);
        node.hash_next = NIL_IDX;
        self.free.push(idx);
        self.len -= 1;
        old
    }

    /// Double the bucket table and re-thread every hash chain. Node
    /// hashes are stored, so no key is consulted.
    fn grow(&mut self) {
        let new_size = (self.table.len() * 2).max(4);
        tracing::trace!(new_size, len = self.len, "map rehash");
        self.table = vec![NIL_IDX; new_size];
        let mut idx = self.head;
        while idx != NIL_IDX {
            let hash = self.nodes[idx as usize].hash;
            let bucket = self.bucket(hash);
            self.nodes[idx as usize].hash_next = self.table[bucket];
            self.table[bucket] = idx;
            idx = self.nodes[idx as usize].next;
        }
    }

    fn pairs(&self) -> Vec<(Value, Value)> {
        let mut out = Vec::with_capacity(self.len);
        let mut idx = self.head;
        while idx != NIL_IDX {
            let node = &self.nodes[idx as usize];
            out.push((node.key.clone(), node.value.clone()));
            idx = node.next;
        }
        out
    }
}

/// An insertion-ordered, optionally typed, freezable map of values.
#[derive(Clone)]
pub struct Map(Arc<RwLock<MapData>>);

impl Map {
    /// An empty, untyped, mutable map.
    pub fn new() -> Map {
        Map::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Map {
        Map(Arc::new(RwLock::new(MapData::with_capacity(capacity))))
    }

    /// A mutable, untyped map holding `pairs` in order. Later
    /// duplicates of a key overwrite earlier ones.
    pub fn from_pairs(pairs: Vec<(Value, Value)>) -> Map {
        Map::from_parts(pairs, false)
    }

    /// An empty mutable map carrying a declared type. Required entries
    /// of a struct-map type are enforced at freeze and instance time,
    /// so an empty map is a legal starting point.
    pub fn typed(typ: Type) -> Result<Map> {
        let map = Map::new();
        map.set_type(Some(typ))?;
        Ok(map)
    }

    pub(crate) fn from_parts(pairs: Vec<(Value, Value)>, frozen: bool) -> Map {
        let mut data = MapData::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = match key.frozen_copy() {
                Ok(frozen) => frozen,
                Err(_) => key,
            };
            let hash = key.hash_code();
            match data.find(&key, hash) {
                Some(idx) => data.nodes[idx as usize].value = value,
                None => data.insert_tail(key, value, hash),
            }
        }
        data.frozen = frozen;
        Map(Arc::new(RwLock::new(data)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().len == 0
    }

    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    pub fn declared_type(&self) -> Option<Type> {
        self.0.read().typ.clone()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// A snapshot of the entries in insertion order.
    pub fn snapshot(&self) -> Vec<(Value, Value)> {
        self.0.read().pairs()
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<Value> {
        let hash = key.hash_code();
        let data = self.0.read();
        data.find(key, hash)
            .map(|idx| data.nodes[idx as usize].value.clone())
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        let hash = key.hash_code();
        self.0.read().find(key, hash).is_some()
    }

    /// The type of this map: the declared type when set, else the
    /// exact type backed by the map itself.
    pub fn type_of(&self) -> Type {
        match self.declared_type() {
            Some(t) => t,
            None => Type::exact(Value::Map(self.clone())),
        }
    }

    /// Declare (or clear) the constraint type. Present entries must
    /// satisfy the new type; missing required entries of a struct-map
    /// type are tolerated until finalization.
    pub fn set_type(&self, typ: Option<Type>) -> Result<()> {
        if self.is_frozen() {
            return Err(error::frozen("Map", "set_type"));
        }
        let Some(t) = typ else {
            self.0.write().typ = None;
            return Ok(());
        };
        // Aliases are stored resolved so entry checks see the
        // structural type.
        let t = ty::follow_alias(&t).unwrap_or(t);
        let Some((_, max)) = ty::map_kind_bounds(t.kind()) else {
            return Err(error::type_assertion(format!("{t} is not a map type")));
        };
        let pairs = self.snapshot();
        if pairs.len() > max {
            return Err(error::illegal_size(&t, pairs.len()));
        }
        for (k, v) in &pairs {
            check_pair(&t, k, v)?;
        }
        tracing::debug!(%t, "map type declared");
        self.0.write().typ = Some(t);
        Ok(())
    }
}

/// A key/value pair must satisfy the declared type: a sized map checks
/// both halves, a struct map matches the key against its entries.
fn check_pair(typ: &Type, key: &Value, value: &Value) -> Result<()> {
    match typ.kind() {
        TypeKind::MapSized {
            key: key_t,
            value: value_t,
            ..
        } => {
            if !key_t.instance(key) {
                return Err(error::illegal_assignment(key_t, key));
            }
            if !value_t.instance(value) {
                return Err(error::illegal_assignment(value_t, value));
            }
            Ok(())
        }
        TypeKind::StructMap {
            entries,
            additional,
        } => match entries.iter().find(|e| e.key().instance(key)) {
            Some(entry) => {
                if !entry.value().instance(value) {
                    return Err(error::illegal_assignment(entry.value(), value));
                }
                Ok(())
            }
            None => {
                if *additional {
                    Ok(())
                } else {
                    Err(error::illegal_assignment(typ, key))
                }
            }
        },
        _ => Ok(()),
    }
}

// Mutation

impl Map {
    /// Store `value` under `key`, returning the previous value. The
    /// key is stored as a deep-frozen copy.
    pub fn put(&self, key: Value, value: Value) -> Result<Option<Value>> {
        let hash = key.hash_code();
        let (frozen, typ, len, replacing) = {
            let data = self.0.read();
            (
                data.frozen,
                data.typ.clone(),
                data.len,
                data.find(&key, hash).is_some(),
            )
        };
        if frozen {
            return Err(error::frozen("Map", "put"));
        }
        if let Some(t) = &typ {
            if !replacing {
                let (_, max) = ty::map_kind_bounds(t.kind()).expect("declared type is map-kind");
                if len + 1 > max {
                    return Err(error::illegal_size(t, len + 1));
                }
            }
            check_pair(t, &key, &value)?;
        }
        let key = key.frozen_copy()?;
        let mut data = self.0.write();
        match data.find(&key, hash) {
            Some(idx) => Ok(Some(std::mem::replace(
                &mut data.nodes[idx as usize].value,
                value,
            ))),
            None => {
                data.insert_tail(key, value, hash);
                Ok(None)
            }
        }
    }

    /// Store every entry of `other`, in its insertion order.
    pub fn put_all(&self, other: &Map) -> Result<()> {
        for (k, v) in other.snapshot() {
            self.put(k, v)?;
        }
        Ok(())
    }

    /// Remove `key`, returning the value that was stored under it.
    pub fn remove(&self, key: &Value) -> Result<Option<Value>> {
        let hash = key.hash_code();
        let (frozen, typ, len, present) = {
            let data = self.0.read();
            (
                data.frozen,
                data.typ.clone(),
                data.len,
                data.find(key, hash).is_some(),
            )
        };
        if frozen {
            return Err(error::frozen("Map", "remove"));
        }
        if !present {
            return Ok(None);
        }
        if let Some(t) = &typ {
            let (min, _) = ty::map_kind_bounds(t.kind()).expect("declared type is map-kind");
            if len - 1 < min {
                return Err(error::illegal_size(t, len - 1));
            }
        }
        let mut data = self.0.write();
        Ok(data.find(key, hash).map(|idx| data.unlink(idx)))
    }

    /// Remove every key held by `keys`.
    pub fn remove_all(&self, keys: &crate::array::Array) -> Result<()> {
        for key in keys.values() {
            self.remove(&key)?;
        }
        Ok(())
    }
}

// Freezing and copying

impl Map {
    /// Freeze this map and, recursively, its entries. One-way.
    ///
    /// A struct-map-typed map verifies its required entries here: this
    /// is the finalization point for incremental construction.
    pub fn freeze(&self) -> Result<()> {
        self.assert_required_entries()?;
        let pairs = {
            let mut data = self.0.write();
            if data.frozen {
                return Ok(());
            }
            data.frozen = true;
            data.pairs()
        };
        for (k, v) in &pairs {
            k.freeze()?;
            v.freeze()?;
        }
        Ok(())
    }

    /// A deep-frozen copy. Returns the receiver when already frozen.
    pub fn frozen_copy(&self) -> Result<Map> {
        self.copy(true)
    }

    /// A shallow copy. With `frozen`, entries are replaced by their
    /// deep-frozen copies and the result is frozen.
    pub fn copy(&self, frozen: bool) -> Result<Map> {
        if frozen && self.is_frozen() {
            return Ok(self.clone());
        }
        if frozen {
            self.assert_required_entries()?;
        }
        let (mut pairs, typ) = {
            let data = self.0.read();
            (data.pairs(), data.typ.clone())
        };
        if frozen {
            for (k, v) in &mut pairs {
                *k = k.frozen_copy()?;
                *v = v.frozen_copy()?;
            }
        }
        let copy = Map::from_parts(pairs, frozen);
        copy.0.write().typ = typ;
        Ok(copy)
    }

    fn assert_required_entries(&self) -> Result<()> {
        let Some(t) = self.declared_type() else {
            return Ok(());
        };
        let TypeKind::StructMap { entries, .. } = t.kind() else {
            return Ok(());
        };
        let pairs = self.snapshot();
        for entry in entries.iter().filter(|e| e.required()) {
            if !pairs.iter().any(|(k, _)| entry.key().instance(k)) {
                return Err(error::type_assertion(format!(
                    "required key {} is missing",
                    entry.key()
                )));
            }
        }
        Ok(())
    }
}

// Non-mutating builders

impl Map {
    /// A new map with `value` stored under `key`, preserving the
    /// declared type and frozen-ness.
    pub fn with(&self, key: Value, value: Value) -> Result<Map> {
        let copy = self.copy(false)?;
        copy.put(key, value)?;
        if self.is_frozen() {
            copy.freeze()?;
        }
        Ok(copy)
    }

    /// A new map without `key`.
    pub fn without(&self, key: &Value) -> Result<Map> {
        let copy = self.copy(false)?;
        copy.remove(key)?;
        if self.is_frozen() {
            copy.freeze()?;
        }
        Ok(copy)
    }
}

// Iteration

impl Map {
    /// The keys, in insertion order.
    pub fn keys(&self) -> crate::array::Array {
        let keys = self.snapshot().into_iter().map(|(k, _)| k).collect();
        crate::array::Array::from_parts(keys, None, self.is_frozen())
    }

    /// The values, in insertion order.
    pub fn values(&self) -> crate::array::Array {
        let values = self.snapshot().into_iter().map(|(_, v)| v).collect();
        crate::array::Array::from_parts(values, None, self.is_frozen())
    }

    /// The entries, in insertion order.
    pub fn entries(&self) -> crate::array::Array {
        let entries = self
            .snapshot()
            .into_iter()
            .map(|(k, v)| Value::Entry(MapEntry::new(k, v)))
            .collect();
        crate::array::Array::from_parts(entries, None, self.is_frozen())
    }

    pub fn each(&self, mut f: impl FnMut(&Value, &Value)) {
        for (k, v) in self.snapshot() {
            f(&k, &v);
        }
    }

    pub fn each_entry(&self, mut f: impl FnMut(&MapEntry)) {
        for (k, v) in self.snapshot() {
            f(&MapEntry::new(k, v));
        }
    }

    pub fn each_key(&self, mut f: impl FnMut(&Value)) {
        for (k, _) in self.snapshot() {
            f(&k);
        }
    }

    pub fn each_value(&self, mut f: impl FnMut(&Value)) {
        for (_, v) in self.snapshot() {
            f(&v);
        }
    }
}

impl Default for Map {
    fn default() -> Self {
        Map::new()
    }
}

impl From<Vec<(Value, Value)>> for Map {
    fn from(pairs: Vec<(Value, Value)>) -> Self {
        Map::from_pairs(pairs)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        crate::deep::value_equals(
            &mut RecursionGuard::default(),
            &Value::Map(self.clone()),
            &Value::Map(other.clone()),
        )
    }
}

impl Eq for Map {}

impl Hash for Map {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(Value::Map(self.clone()).hash_code());
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.snapshot().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Map({self})")
    }
}

/// A key/value pair, as yielded by [`Map::entries`].
#[derive(Clone)]
pub struct MapEntry(Arc<(Value, Value)>);

impl MapEntry {
    pub fn new(key: Value, value: Value) -> MapEntry {
        MapEntry(Arc::new((key, value)))
    }

    #[inline]
    pub fn key(&self) -> &Value {
        &self.0 .0
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.0 .1
    }

    /// An entry holding deep-frozen copies of both halves.
    pub fn frozen_copy(&self) -> Result<MapEntry> {
        Ok(MapEntry::new(
            self.key().frozen_copy()?,
            self.value().frozen_copy()?,
        ))
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for MapEntry {
    fn eq(&self, other: &Self) -> bool {
        let mut guard = RecursionGuard::default();
        crate::deep::value_equals(&mut guard, self.key(), other.key())
            && crate::deep::value_equals(&mut guard, self.value(), other.value())
    }
}

impl Eq for MapEntry {}

impl fmt::Display for MapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key(), self.value())
    }
}

impl fmt::Debug for MapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapEntry({self})")
    }
}

#[cfg(test)]
mod tests;
