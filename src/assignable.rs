//! The assignability and instance engine.
//!
//! One central dispatcher covers the whole lattice: `assignable`
//! matches on the left-hand variant and, when the left side does not
//! recognize the right-hand variant, delegates the dual question to the
//! right side (`assignable_to`). That reverse step is what lets
//! composite types and exact types on the right participate: an exact
//! type is assignable to any type the wrapped value is an instance of,
//! a disjunction is assignable to a target that admits every
//! alternative.
//!
//! Both entry points carry a recursion guard; re-entering a pair that
//! is already being compared is answered `true` (the coinductive
//! assumption for self-referential types).

use crate::deep::{type_equals, value_equals};
use crate::guard::RecursionGuard;
use crate::ty::{element_type, tuple_bounds, tuple_pos_type};
use crate::ty::{StructMapEntry, Type, TypeKind, UNBOUNDED};
use crate::value::Value;

/// True when every instance of `right` is an instance of `left`.
pub(crate) fn assignable(g: &mut RecursionGuard, left: &Type, right: &Type) -> bool {
    if left.ptr_eq(right) {
        return true;
    }
    if matches!(left.kind(), TypeKind::Alias(_)) {
        return match crate::ty::follow_alias(left) {
            Some(t) => assignable(g, &t, right),
            None => false,
        };
    }
    if matches!(right.kind(), TypeKind::Alias(_)) {
        return match crate::ty::follow_alias(right) {
            Some(t) => assignable(g, left, &t),
            None => false,
        };
    }
    if !g.enter(left.ptr_id(), right.ptr_id()) {
        return true;
    }
    let out = assignable_inner(g, left, right);
    g.exit();
    out
}

fn assignable_inner(g: &mut RecursionGuard, left: &Type, right: &Type) -> bool {
    use TypeKind::*;
    match left.kind() {
        Any => true,
        Nil => match right.kind() {
            Nil => true,
            _ => assignable_to(g, right, left),
        },
        Boolean => match right.kind() {
            Boolean | True | False => true,
            _ => assignable_to(g, right, left),
        },
        True => match right.kind() {
            True => true,
            _ => assignable_to(g, right, left),
        },
        False => match right.kind() {
            False => true,
            _ => assignable_to(g, right, left),
        },
        Integer => match right.kind() {
            Integer | IntegerRange { .. } => true,
            _ => assignable_to(g, right, left),
        },
        IntegerRange {
            min,
            max,
            inclusive,
        } => match right.kind() {
            IntegerRange {
                min: omin,
                max: omax,
                inclusive: oincl,
            } => {
                let hi_fits = if *oincl && !*inclusive {
                    omax < max
                } else {
                    omax <= max
                };
                min <= omin && hi_fits
            }
            _ => assignable_to(g, right, left),
        },
        Float => match right.kind() {
            Float | FloatRange { .. } => true,
            _ => assignable_to(g, right, left),
        },
        FloatRange {
            min,
            max,
            inclusive,
        } => match right.kind() {
            FloatRange {
                min: omin,
                max: omax,
                inclusive: oincl,
            } => {
                let hi_fits = if *oincl && !*inclusive {
                    omax < max
                } else {
                    omax <= max
                };
                min <= omin && hi_fits
            }
            _ => assignable_to(g, right, left),
        },
        String => match right.kind() {
            String | StringSized { .. } | StringPattern(_) | Ci(_) => true,
            _ => assignable_to(g, right, left),
        },
        StringSized { min, max } => match right.kind() {
            StringSized {
                min: omin,
                max: omax,
            } => min <= omin && omax <= max,
            _ => assignable_to(g, right, left),
        },
        StringPattern(re) => match right.kind() {
            StringPattern(ore) => re.as_str() == ore.as_str(),
            _ => assignable_to(g, right, left),
        },
        Ci(s) => match right.kind() {
            Ci(os) => s == os,
            _ => assignable_to(g, right, left),
        },
        Binary => match right.kind() {
            Binary => true,
            _ => assignable_to(g, right, left),
        },
        Array => match right.kind() {
            Array | ArraySized { .. } | Tuple { .. } => true,
            _ => assignable_to(g, right, left),
        },
        ArraySized { elem, min, max } => match right.kind() {
            // The default array lacks a size bound.
            Array => false,
            ArraySized {
                elem: oelem,
                min: omin,
                max: omax,
            } => min <= omin && omax <= max && assignable(g, elem, oelem),
            Tuple { types, variadic } => {
                let (omin, omax) = tuple_bounds(types, *variadic);
                *min <= omin
                    && omax <= *max
                    && positions_of(types, *variadic).iter().all(|pt| assignable(g, elem, pt))
            }
            _ => assignable_to(g, right, left),
        },
        Tuple { types, variadic } => match right.kind() {
            Array => false,
            Tuple {
                types: otypes,
                variadic: ovariadic,
            } => tuple_assignable_tuple(g, types, *variadic, otypes, *ovariadic),
            ArraySized {
                elem: oelem,
                min: omin,
                max: omax,
            } => {
                let (min, max) = tuple_bounds(types, *variadic);
                min <= *omin
                    && *omax <= max
                    && positions_of(types, *variadic).iter().all(|pt| assignable(g, pt, oelem))
            }
            _ => assignable_to(g, right, left),
        },
        Map => match right.kind() {
            Map | MapSized { .. } | StructMap { .. } => true,
            _ => assignable_to(g, right, left),
        },
        MapSized {
            key,
            value,
            min,
            max,
        } => match right.kind() {
            // The default map lacks a size bound.
            Map => false,
            MapSized {
                key: okey,
                value: ovalue,
                min: omin,
                max: omax,
            } => {
                min <= omin
                    && omax <= max
                    && assignable(g, key, okey)
                    && assignable(g, value, ovalue)
            }
            StructMap {
                entries,
                additional,
            } => {
                let required = entries.iter().filter(|e| e.required()).count();
                let omax = if *additional { UNBOUNDED } else { entries.len() };
                // Additional entries are unconstrained, so they only fit
                // a fully open key/value pair.
                let open_enough = !*additional
                    || (matches!(key.kind(), Any) && matches!(value.kind(), Any));
                *min <= required
                    && omax <= *max
                    && open_enough
                    && entries.iter().all(|e| {
                        assignable(g, key, e.key()) && assignable(g, value, e.value())
                    })
            }
            _ => assignable_to(g, right, left),
        },
        StructMap {
            entries,
            additional,
        } => match right.kind() {
            StructMap {
                entries: oentries,
                additional: oadditional,
            } => struct_assignable_struct(g, entries, *additional, oentries, *oadditional),
            Map | MapSized { .. } => false,
            _ => assignable_to(g, right, left),
        },
        AllOf(ts) => ts.iter().all(|t| assignable(g, t, right)),
        AnyOf(ts) => {
            ts.iter().any(|t| assignable(g, t, right)) || assignable_to(g, right, left)
        }
        OneOf(ts) => {
            exactly_one(ts.iter(), |t| assignable(g, t, right))
                || assignable_to(g, right, left)
        }
        Not(t) => match right.kind() {
            Not(u) => assignable(g, u, t),
            Exact(v) => !instance(g, t, v),
            AllOf(_) | AnyOf(_) | OneOf(_) => assignable_to(g, right, left),
            _ => match (family(t.kind()), family(right.kind())) {
                (Some(a), Some(b)) => a != b,
                _ => false,
            },
        },
        Exact(v) => match right.kind() {
            Exact(ov) => value_equals(g, v, ov),
            _ => assignable_to(g, right, left),
        },
        Meta(op) => match right.kind() {
            Meta(oop) => match (op, oop) {
                (None, None) => true,
                (Some(a), Some(b)) => type_equals(g, a, b),
                _ => false,
            },
            _ => assignable_to(g, right, left),
        },
        Native { id, .. } => match right.kind() {
            Native { id: oid, .. } => id == oid,
            _ => assignable_to(g, right, left),
        },
        Alias(_) => unreachable!("aliases are resolved before dispatch"),
    }
}

/// The dual question: can a slot of `target` hold every value of
/// `source`? Consulted when `target`'s own rules did not recognize the
/// `source` variant.
fn assignable_to(g: &mut RecursionGuard, source: &Type, target: &Type) -> bool {
    use TypeKind::*;
    match source.kind() {
        // Every alternative must fit the target.
        AnyOf(ts) | OneOf(ts) => !ts.is_empty() && ts.iter().all(|t| assignable(g, target, t)),
        // One conjunct fitting is enough: the intersection is narrower.
        AllOf(ts) => ts.iter().any(|t| assignable(g, target, t)),
        // An exact type fits any type its value belongs to.
        Exact(v) => instance(g, target, v),
        _ => false,
    }
}

/// True when `value` belongs to `t`.
pub(crate) fn instance(g: &mut RecursionGuard, t: &Type, value: &Value) -> bool {
    if matches!(t.kind(), TypeKind::Alias(_)) {
        return match crate::ty::follow_alias(t) {
            Some(rt) => instance(g, &rt, value),
            None => false,
        };
    }
    match value.identity() {
        Some(id) => {
            if !g.enter(t.ptr_id(), id) {
                return true;
            }
            let out = instance_inner(g, t, value);
            g.exit();
            out
        }
        None => instance_inner(g, t, value),
    }
}

fn instance_inner(g: &mut RecursionGuard, t: &Type, value: &Value) -> bool {
    use TypeKind::*;
    match t.kind() {
        Any => true,
        Nil => value.is_nil(),
        Boolean => matches!(value, Value::Boolean(_)),
        True => matches!(value, Value::Boolean(true)),
        False => matches!(value, Value::Boolean(false)),
        Integer => matches!(value, Value::Integer(_)),
        IntegerRange {
            min,
            max,
            inclusive,
        } => match value {
            Value::Integer(n) => n >= min && (n < max || (*inclusive && n == max)),
            _ => false,
        },
        Float => matches!(value, Value::Float(_)),
        FloatRange {
            min,
            max,
            inclusive,
        } => match value {
            Value::Float(f) => f >= min && (f < max || (*inclusive && f == max)),
            _ => false,
        },
        String => matches!(value, Value::String(_)),
        StringSized { min, max } => match value {
            Value::String(s) => s.len() >= *min && s.len() <= *max,
            _ => false,
        },
        StringPattern(re) => match value {
            Value::String(s) => re.is_match(s.as_str()),
            _ => false,
        },
        Ci(lowered) => match value {
            Value::String(s) => s.to_lowercase() == lowered.as_str(),
            _ => false,
        },
        Binary => matches!(value, Value::Binary(_)),
        Array => matches!(value, Value::Array(_)),
        ArraySized { elem, min, max } => match value {
            Value::Array(a) => {
                let n = a.len();
                n >= *min
                    && n <= *max
                    && (matches!(elem.kind(), Any)
                        || a.values().iter().all(|e| instance(g, elem, e)))
            }
            _ => false,
        },
        Tuple { types, variadic } => match value {
            Value::Array(a) => tuple_instance(g, types, *variadic, &a.values()),
            _ => false,
        },
        Map => matches!(value, Value::Map(_)),
        MapSized {
            key,
            value: val_t,
            min,
            max,
        } => match value {
            Value::Map(m) => {
                let n = m.len();
                n >= *min
                    && n <= *max
                    && m.snapshot()
                        .iter()
                        .all(|(k, v)| instance(g, key, k) && instance(g, val_t, v))
            }
            _ => false,
        },
        StructMap {
            entries,
            additional,
        } => match value {
            Value::Map(m) => struct_instance(g, entries, *additional, &m.snapshot()),
            _ => false,
        },
        AllOf(ts) => ts.iter().all(|t| instance(g, t, value)),
        AnyOf(ts) => ts.iter().any(|t| instance(g, t, value)),
        OneOf(ts) => exactly_one(ts.iter(), |t| instance(g, t, value)),
        Not(inner) => !instance(g, inner, value),
        Exact(v) => value_equals(g, v, value),
        Meta(op) => match value {
            Value::Type(vt) => match op {
                None => matches!(vt.kind(), Meta(_)),
                Some(operand) => assignable(g, operand, vt),
            },
            _ => false,
        },
        // No core value is backed by a host type.
        Native { .. } => false,
        Alias(_) => unreachable!("aliases are resolved before dispatch"),
    }
}

/// All element types a tuple exposes: the fixed positions, plus the
/// variadic tail's element type.
fn positions_of(types: &[Type], variadic: bool) -> Vec<Type> {
    if variadic {
        let fixed = types.len() - 1;
        let mut out: Vec<Type> = types[..fixed].to_vec();
        out.push(element_type(&types[fixed]));
        out
    } else {
        types.to_vec()
    }
}

fn tuple_assignable_tuple(
    g: &mut RecursionGuard,
    types: &[Type],
    variadic: bool,
    otypes: &[Type],
    ovariadic: bool,
) -> bool {
    let (min, max) = tuple_bounds(types, variadic);
    let (omin, omax) = tuple_bounds(otypes, ovariadic);
    if min > omin || omax > max {
        return false;
    }
    let fixed = if variadic { types.len() - 1 } else { types.len() };
    let ofixed = if ovariadic { otypes.len() - 1 } else { otypes.len() };
    for i in 0..fixed.max(ofixed) {
        let (Some(te), Some(oe)) = (
            tuple_pos_type(types, variadic, i),
            tuple_pos_type(otypes, ovariadic, i),
        ) else {
            return false;
        };
        if !assignable(g, &te, &oe) {
            return false;
        }
    }
    // Positions past both fixed prefixes are governed by the tails.
    if variadic && ovariadic {
        let te = element_type(&types[types.len() - 1]);
        let oe = element_type(&otypes[otypes.len() - 1]);
        if !assignable(g, &te, &oe) {
            return false;
        }
    }
    true
}

fn tuple_instance(g: &mut RecursionGuard, types: &[Type], variadic: bool, elems: &[Value]) -> bool {
    if variadic {
        let (min, max) = tuple_bounds(types, variadic);
        if elems.len() < min || elems.len() > max {
            return false;
        }
        let fixed = types.len() - 1;
        for (i, e) in elems.iter().enumerate().take(fixed) {
            if !instance(g, &types[i], e) {
                return false;
            }
        }
        let tail = element_type(&types[fixed]);
        elems[fixed..].iter().all(|e| instance(g, &tail, e))
    } else {
        elems.len() == types.len()
            && elems.iter().zip(types.iter()).all(|(e, t)| instance(g, t, e))
    }
}

fn struct_assignable_struct(
    g: &mut RecursionGuard,
    entries: &[StructMapEntry],
    additional: bool,
    oentries: &[StructMapEntry],
    oadditional: bool,
) -> bool {
    if !additional && oadditional {
        return false;
    }
    // Every receiver entry must be honored by the other side.
    for e in entries {
        let matched = oentries
            .iter()
            .find(|oe| assignable(g, e.key(), oe.key()));
        match matched {
            Some(oe) => {
                if e.required() && !oe.required() {
                    return false;
                }
                if !assignable(g, e.value(), oe.value()) {
                    return false;
                }
            }
            None => {
                if e.required() {
                    return false;
                }
            }
        }
    }
    if !additional {
        // The other side must not expose entries the receiver lacks.
        for oe in oentries {
            if !entries.iter().any(|e| assignable(g, e.key(), oe.key())) {
                return false;
            }
        }
    }
    true
}

fn struct_instance(
    g: &mut RecursionGuard,
    entries: &[StructMapEntry],
    additional: bool,
    pairs: &[(Value, Value)],
) -> bool {
    for (k, v) in pairs {
        match entries.iter().find(|e| instance(g, e.key(), k)) {
            Some(e) => {
                if !instance(g, e.value(), v) {
                    return false;
                }
            }
            None => {
                if !additional {
                    return false;
                }
            }
        }
    }
    entries
        .iter()
        .filter(|e| e.required())
        .all(|e| pairs.iter().any(|(k, _)| instance(g, e.key(), k)))
}

/// Kind families used by the conservative `Not` disjointness test.
#[derive(Copy, Clone, Eq, PartialEq)]
enum Family {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Binary,
    Array,
    Map,
    Type,
}

fn family(kind: &TypeKind) -> Option<Family> {
    use TypeKind::*;
    match kind {
        Nil => Some(Family::Nil),
        Boolean | True | False => Some(Family::Boolean),
        Integer | IntegerRange { .. } => Some(Family::Integer),
        Float | FloatRange { .. } => Some(Family::Float),
        String | StringSized { .. } | StringPattern(_) | Ci(_) => Some(Family::String),
        Binary => Some(Family::Binary),
        Array | ArraySized { .. } | Tuple { .. } => Some(Family::Array),
        Map | MapSized { .. } | StructMap { .. } => Some(Family::Map),
        Meta(_) => Some(Family::Type),
        Exact(v) => match v {
            Value::Integer(_) => Some(Family::Integer),
            Value::Float(_) => Some(Family::Float),
            Value::String(_) => Some(Family::String),
            Value::Binary(_) => Some(Family::Binary),
            Value::Array(_) => Some(Family::Array),
            Value::Map(_) => Some(Family::Map),
            _ => None,
        },
        _ => None,
    }
}

fn exactly_one<T>(items: impl Iterator<Item = T>, mut pred: impl FnMut(T) -> bool) -> bool {
    let mut found = false;
    for item in items {
        if pred(item) {
            if found {
                return false;
            }
            found = true;
        }
    }
    found
}
