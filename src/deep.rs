//! Deep equality, hashing and comparison.
//!
//! All three walks carry a guard of pointer identities so that cyclic
//! values and cyclic types terminate. Re-entering a pair already being
//! compared yields the neutral answer: equals answers `true`, compare
//! answers `Equal`, hash answers `0`. Locks are never held across a
//! recursive step; collections are snapshotted first.

use std::cmp::Ordering;

use crate::guard::{RecursionGuard, Seen};
use crate::ty::{Type, TypeKind};
use crate::value::Value;

#[inline]
pub(crate) fn mix(h: u64, x: u64) -> u64 {
    h.wrapping_mul(31).wrapping_add(x)
}

// Negative zero equals zero and must hash with it.
#[inline]
fn float_bits(f: f64) -> u64 {
    if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

pub(crate) fn value_equals(g: &mut RecursionGuard, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Binary(x), Value::Binary(y)) => x == y,
        (Value::Entry(x), Value::Entry(y)) => {
            if x.identity() == y.identity() {
                return true;
            }
            if !g.enter(x.identity(), y.identity()) {
                return true;
            }
            let out = value_equals(g, x.key(), y.key()) && value_equals(g, x.value(), y.value());
            g.exit();
            out
        }
        (Value::Array(x), Value::Array(y)) => {
            if x.identity() == y.identity() {
                return true;
            }
            if !g.enter(x.identity(), y.identity()) {
                return true;
            }
            let xs = x.values();
            let ys = y.values();
            let out = xs.len() == ys.len()
                && xs.iter().zip(ys.iter()).all(|(xe, ye)| value_equals(g, xe, ye));
            g.exit();
            out
        }
        (Value::Map(x), Value::Map(y)) => {
            if x.identity() == y.identity() {
                return true;
            }
            if !g.enter(x.identity(), y.identity()) {
                return true;
            }
            let out = x.len() == y.len()
                && x.snapshot().iter().all(|(k, v)| match y.get(k) {
                    Some(other) => value_equals(g, v, &other),
                    None => false,
                });
            g.exit();
            out
        }
        (Value::Type(x), Value::Type(y)) => type_equals(g, x, y),
        _ => false,
    }
}

pub(crate) fn value_hash(seen: &mut Seen, v: &Value) -> u64 {
    match v {
        Value::Nil => 131,
        Value::Boolean(true) => 1231,
        Value::Boolean(false) => 1237,
        Value::Integer(n) => *n as u64,
        Value::Float(f) => float_bits(*f),
        Value::String(s) => s.hash_code(),
        Value::Binary(b) => b.hash_code(),
        Value::Entry(e) => {
            if !seen.enter(e.identity()) {
                return 0;
            }
            let h = mix(value_hash(seen, e.key()), value_hash(seen, e.value()));
            seen.exit();
            h
        }
        Value::Array(a) => {
            if !seen.enter(a.identity()) {
                return 0;
            }
            let mut h = 1u64;
            for e in a.values() {
                h = mix(h, value_hash(seen, &e));
            }
            seen.exit();
            h
        }
        Value::Map(m) => {
            if !seen.enter(m.identity()) {
                return 0;
            }
            // Order-independent: sum the per-entry hashes.
            let mut h = 0u64;
            for (k, val) in m.snapshot() {
                h = h.wrapping_add(mix(value_hash(seen, &k), value_hash(seen, &val)));
            }
            seen.exit();
            h
        }
        Value::Type(t) => type_hash(seen, t),
    }
}

pub(crate) fn value_compare(g: &mut RecursionGuard, a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Some(Ordering::Equal),
        (Value::Nil, _) => Some(Ordering::Less),
        (_, Value::Nil) => Some(Ordering::Greater),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::Integer(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Integer(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.as_str().cmp(y.as_str())),
        (Value::Binary(x), Value::Binary(y)) => Some(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            if x.identity() == y.identity() {
                return Some(Ordering::Equal);
            }
            if !g.enter(x.identity(), y.identity()) {
                return Some(Ordering::Equal);
            }
            let out = compare_slices(g, &x.values(), &y.values());
            g.exit();
            out
        }
        _ => None,
    }
}

fn compare_slices(g: &mut RecursionGuard, a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        match value_compare(g, x, y)? {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }
    Some(a.len().cmp(&b.len()))
}

pub(crate) fn type_equals(g: &mut RecursionGuard, a: &Type, b: &Type) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if !g.enter(a.ptr_id(), b.ptr_id()) {
        return true;
    }
    let out = type_equals_inner(g, a, b);
    g.exit();
    out
}

fn type_equals_inner(g: &mut RecursionGuard, a: &Type, b: &Type) -> bool {
    use TypeKind::*;
    match (a.kind(), b.kind()) {
        (Alias(x), _) => match x.resolved() {
            Some(t) => type_equals(g, &t, b),
            None => match b.kind() {
                Alias(y) if y.resolved().is_none() => x.name() == y.name(),
                _ => false,
            },
        },
        (_, Alias(y)) => match y.resolved() {
            Some(t) => type_equals(g, a, &t),
            None => false,
        },
        (Any, Any)
        | (Nil, Nil)
        | (Boolean, Boolean)
        | (True, True)
        | (False, False)
        | (Integer, Integer)
        | (Float, Float)
        | (String, String)
        | (Binary, Binary)
        | (Array, Array)
        | (Map, Map) => true,
        (
            IntegerRange {
                min: m1,
                max: x1,
                inclusive: i1,
            },
            IntegerRange {
                min: m2,
                max: x2,
                inclusive: i2,
            },
        ) => m1 == m2 && x1 == x2 && i1 == i2,
        (
            FloatRange {
                min: m1,
                max: x1,
                inclusive: i1,
            },
            FloatRange {
                min: m2,
                max: x2,
                inclusive: i2,
            },
        ) => m1 == m2 && x1 == x2 && i1 == i2,
        (StringSized { min: m1, max: x1 }, StringSized { min: m2, max: x2 }) => {
            m1 == m2 && x1 == x2
        }
        (StringPattern(r1), StringPattern(r2)) => r1.as_str() == r2.as_str(),
        (Ci(s1), Ci(s2)) => s1 == s2,
        (
            ArraySized {
                elem: e1,
                min: m1,
                max: x1,
            },
            ArraySized {
                elem: e2,
                min: m2,
                max: x2,
            },
        ) => m1 == m2 && x1 == x2 && type_equals(g, e1, e2),
        (
            Tuple {
                types: t1,
                variadic: v1,
            },
            Tuple {
                types: t2,
                variadic: v2,
            },
        ) => {
            v1 == v2
                && t1.len() == t2.len()
                && t1.iter().zip(t2.iter()).all(|(x, y)| type_equals(g, x, y))
        }
        (
            MapSized {
                key: k1,
                value: v1,
                min: m1,
                max: x1,
            },
            MapSized {
                key: k2,
                value: v2,
                min: m2,
                max: x2,
            },
        ) => m1 == m2 && x1 == x2 && type_equals(g, k1, k2) && type_equals(g, v1, v2),
        (
            StructMap {
                entries: e1,
                additional: a1,
            },
            StructMap {
                entries: e2,
                additional: a2,
            },
        ) => {
            a1 == a2
                && e1.len() == e2.len()
                && e1.iter().zip(e2.iter()).all(|(x, y)| {
                    x.required() == y.required()
                        && type_equals(g, x.key(), y.key())
                        && type_equals(g, x.value(), y.value())
                })
        }
        (AllOf(t1), AllOf(t2)) | (AnyOf(t1), AnyOf(t2)) | (OneOf(t1), OneOf(t2)) => {
            t1.len() == t2.len() && t1.iter().zip(t2.iter()).all(|(x, y)| type_equals(g, x, y))
        }
        (Not(t1), Not(t2)) => type_equals(g, t1, t2),
        (Exact(v1), Exact(v2)) => value_equals(g, v1, v2),
        (Meta(None), Meta(None)) => true,
        (Meta(Some(t1)), Meta(Some(t2))) => type_equals(g, t1, t2),
        (Native { id: i1, .. }, Native { id: i2, .. }) => i1 == i2,
        _ => false,
    }
}

pub(crate) fn type_hash(seen: &mut Seen, t: &Type) -> u64 {
    if !seen.enter(t.ptr_id()) {
        return 0;
    }
    let seed = t.type_identifier().seed();
    let h = match t.kind() {
        TypeKind::IntegerRange {
            min,
            max,
            inclusive,
        } => mix(mix(mix(seed, *min as u64), *max as u64), u64::from(*inclusive)),
        TypeKind::FloatRange {
            min,
            max,
            inclusive,
        } => mix(
            mix(mix(seed, float_bits(*min)), float_bits(*max)),
            u64::from(*inclusive),
        ),
        TypeKind::StringSized { min, max } => mix(mix(seed, *min as u64), *max as u64),
        TypeKind::StringPattern(re) => {
            use std::hash::Hasher;
            let mut h = rustc_hash::FxHasher::default();
            h.write(re.as_str().as_bytes());
            mix(seed, h.finish())
        }
        TypeKind::Ci(s) => mix(seed, s.hash_code()),
        TypeKind::ArraySized { elem, min, max } => mix(
            mix(mix(seed, type_hash(seen, elem)), *min as u64),
            *max as u64,
        ),
        TypeKind::Tuple { types, variadic } => {
            let mut h = if *variadic { mix(seed, 7) } else { seed };
            for t in types {
                h = mix(h, type_hash(seen, t));
            }
            h
        }
        TypeKind::MapSized {
            key,
            value,
            min,
            max,
        } => mix(
            mix(
                mix(mix(seed, type_hash(seen, key)), type_hash(seen, value)),
                *min as u64,
            ),
            *max as u64,
        ),
        TypeKind::StructMap {
            entries,
            additional,
        } => {
            let mut h = mix(seed, u64::from(*additional));
            for e in entries {
                h = mix(
                    mix(mix(h, type_hash(seen, e.key())), type_hash(seen, e.value())),
                    u64::from(e.required()),
                );
            }
            h
        }
        TypeKind::AllOf(ts) | TypeKind::AnyOf(ts) | TypeKind::OneOf(ts) => {
            let mut h = seed;
            for t in ts {
                h = mix(h, type_hash(seen, t));
            }
            h
        }
        TypeKind::Not(inner) => mix(seed, type_hash(seen, inner)),
        TypeKind::Exact(v) => mix(seed, value_hash(seen, v)),
        // The prime keeps meta hashes away from their operands'.
        TypeKind::Meta(Some(op)) => mix(1321, type_hash(seen, op)),
        TypeKind::Meta(None) => 1321,
        TypeKind::Native { id, .. } => {
            use std::hash::{Hash, Hasher};
            let mut hasher = rustc_hash::FxHasher::default();
            id.hash(&mut hasher);
            mix(seed, hasher.finish())
        }
        TypeKind::Alias(a) => match a.resolved() {
            Some(target) => type_hash(seen, &target),
            None => mix(seed, a.name().hash_code()),
        },
        // Default kinds hash to their identifier seed alone.
        _ => seed,
    };
    seen.exit();
    h
}
