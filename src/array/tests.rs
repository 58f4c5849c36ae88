use super::*;
use crate::error::ErrorKind;

fn ints(values: &[i64]) -> Array {
    Array::from_values(values.iter().copied().map(Value::from).collect())
}

#[test]
fn add_get_len() {
    let a = Array::new();
    assert!(a.is_empty());
    a.add(Value::from(1)).unwrap();
    a.add(Value::from("x")).unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a.get(0), Some(Value::from(1)));
    assert_eq!(a.get(2), None);
}

#[test]
fn insert_set_remove_pop() {
    let a = ints(&[1, 3]);
    a.insert(1, Value::from(2)).unwrap();
    assert_eq!(a.values(), vec![Value::from(1), Value::from(2), Value::from(3)]);
    let old = a.set(0, Value::from(0)).unwrap();
    assert_eq!(old, Value::from(1));
    assert_eq!(a.remove(1).unwrap(), Some(Value::from(2)));
    assert_eq!(a.remove(9).unwrap(), None);
    assert_eq!(a.pop().unwrap(), Some(Value::from(3)));
    assert_eq!(a.pop().unwrap(), Some(Value::from(0)));
    assert_eq!(a.pop().unwrap(), None);
}

#[test]
fn remove_value_removes_first_match() {
    let a = ints(&[1, 2, 1]);
    assert!(a.remove_value(&Value::from(1)).unwrap());
    assert_eq!(a.values(), vec![Value::from(2), Value::from(1)]);
    assert!(!a.remove_value(&Value::from(9)).unwrap());
}

#[test]
fn frozen_arrays_reject_mutation() {
    let a = ints(&[1]);
    a.freeze().unwrap();
    for err in [
        a.add(Value::from(2)).unwrap_err(),
        a.insert(0, Value::from(2)).unwrap_err(),
        a.set(0, Value::from(2)).unwrap_err(),
        a.remove(0).unwrap_err(),
        a.pop().unwrap_err(),
        a.set_type(None).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::FrozenMutation);
    }
    assert_eq!(a.len(), 1);
}

#[test]
fn freeze_is_idempotent_and_recursive() {
    let inner = ints(&[1]);
    let a = Array::from_values(vec![Value::Array(inner.clone())]);
    a.freeze().unwrap();
    a.freeze().unwrap();
    assert!(a.is_frozen());
    assert!(inner.is_frozen());
}

#[test]
fn frozen_copy_is_deep_and_isolated() {
    let inner = ints(&[1]);
    let a = Array::from_values(vec![Value::Array(inner.clone())]);
    let frozen = a.frozen_copy().unwrap();
    assert!(frozen.is_frozen());
    assert!(!a.is_frozen());
    inner.add(Value::from(2)).unwrap();
    let frozen_inner = frozen.get(0).unwrap();
    assert_eq!(frozen_inner.as_array().unwrap().len(), 1);
}

#[test]
fn frozen_copy_of_frozen_is_the_receiver() {
    let a = ints(&[1]);
    a.freeze().unwrap();
    let b = a.frozen_copy().unwrap();
    assert_eq!(a.identity(), b.identity());
}

#[test]
fn sized_type_enforces_bounds_and_elements() {
    let t = Type::array_sized(Type::integer(), 0, 2);
    let a = Array::typed(t, vec![Value::from(1)]).unwrap();

    let err = a.add(Value::from("x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);

    a.add(Value::from(2)).unwrap();
    let err = a.add(Value::from(3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalSize);
}

#[test]
fn sized_type_enforces_minimum_on_removal() {
    let t = Type::array_sized(Type::integer(), 1, 3);
    let a = Array::typed(t, vec![Value::from(1)]).unwrap();
    let err = a.pop().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalSize);
    assert_eq!(a.len(), 1);
}

#[test]
fn tuple_type_checks_positions() {
    let t = Type::tuple_of(vec![Type::string(), Type::integer()]);
    let a = Array::typed(t, vec![Value::from("k"), Value::from(7)]).unwrap();

    let err = a.set(0, Value::from(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);
    a.set(1, Value::from(8)).unwrap();
}

#[test]
fn variadic_tuple_type_governs_the_tail() {
    let t = Type::variadic_tuple(vec![Type::string(), Type::array_of(Type::integer())])
        .unwrap();
    let a = Array::typed(t, vec![Value::from("k")]).unwrap();
    a.add(Value::from(1)).unwrap();
    a.add(Value::from(2)).unwrap();
    let err = a.add(Value::from("x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);
}

#[test]
fn set_type_validates_current_contents() {
    let a = ints(&[1, 2]);
    a.set_type(Some(Type::array_of(Type::integer()))).unwrap();
    assert_eq!(a.type_of(), Type::array_of(Type::integer()));

    let err = a
        .set_type(Some(Type::array_of(Type::string())))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);

    let err = a
        .set_type(Some(Type::array_sized(Type::integer(), 3, 9)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalSize);

    let err = a.set_type(Some(Type::integer())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeAssertion);
}

#[test]
fn untyped_arrays_have_exact_types() {
    let a = ints(&[1, 2]);
    let t = a.type_of();
    assert!(t.instance(&Value::Array(a.clone())));
    assert!(!t.instance(&Value::Array(ints(&[1]))));
}

#[test]
fn with_preserves_type_and_frozenness() {
    let t = Type::array_sized(Type::integer(), 0, 9);
    let a = Array::typed(t.clone(), vec![Value::from(1)]).unwrap();
    a.freeze().unwrap();
    let b = a.with(Value::from(2)).unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 2);
    assert!(b.is_frozen());
    assert_eq!(b.declared_type(), Some(t));
    assert!(a.with(Value::from("x")).is_err());
}

#[test]
fn with_all_appends_many() {
    let a = ints(&[1]);
    let b = a.with_all(vec![Value::from(2), Value::from(3)]).unwrap();
    assert_eq!(b.len(), 3);
    assert_eq!(a.len(), 1);
}

#[test]
fn map_and_map_to() {
    let a = ints(&[1, 2, 3]);
    let doubled = a.map(|v| Value::from(v.as_integer().unwrap() * 2));
    assert_eq!(doubled.values(), vec![Value::from(2), Value::from(4), Value::from(6)]);
    assert!(doubled.declared_type().is_none());

    let t = Type::array_of(Type::integer());
    let typed = a
        .map_to(&t, |v| Value::from(v.as_integer().unwrap() * 2))
        .unwrap();
    assert_eq!(typed.declared_type(), Some(t.clone()));

    let err = a.map_to(&t, |_| Value::from("x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);

    let small = Type::array_sized(Type::integer(), 0, 2);
    let err = a.map_to(&small, |v| v.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalSize);
}

#[test]
fn select_reject_keep_the_declared_type() {
    let t = Type::array_of(Type::integer());
    let a = Array::typed(t.clone(), vec![Value::from(1), Value::from(2)]).unwrap();
    let odd = a.select(|v| v.as_integer().unwrap() % 2 == 1);
    assert_eq!(odd.values(), vec![Value::from(1)]);
    assert_eq!(odd.declared_type(), Some(t.clone()));
    let even = a.reject(|v| v.as_integer().unwrap() % 2 == 1);
    assert_eq!(even.values(), vec![Value::from(2)]);
}

#[test]
fn reduce_find_all_any_one() {
    let a = ints(&[1, 2, 3]);
    let sum = a.reduce(Value::from(0), |acc, v| {
        Value::from(acc.as_integer().unwrap() + v.as_integer().unwrap())
    });
    assert_eq!(sum, Value::from(6));

    let found = a.find_map(|v| {
        let n = v.as_integer().unwrap();
        (n > 1).then(|| Value::from(n * 10))
    });
    assert_eq!(found, Some(Value::from(20)));

    assert!(a.all(|v| v.as_integer().unwrap() > 0));
    assert!(a.any(|v| v.as_integer().unwrap() == 3));
    assert!(a.one(|v| v.as_integer().unwrap() == 3));
    assert!(!a.one(|v| v.as_integer().unwrap() > 1));
}

#[test]
fn index_of_and_containment() {
    let a = ints(&[1, 2, 2]);
    assert_eq!(a.index_of(&Value::from(2)), Some(1));
    assert_eq!(a.index_of(&Value::from(9)), None);
    assert!(a.contains_all(&ints(&[2, 1])));
    // Multiplicity is respected.
    assert!(a.contains_all(&ints(&[2, 2])));
    assert!(!a.contains_all(&ints(&[1, 1])));
    assert!(a.same_values(&ints(&[2, 1, 2])));
    assert!(!a.same_values(&ints(&[1, 2])));
}

#[test]
fn unique_keeps_first_occurrences() {
    let a = ints(&[3, 1, 3, 2, 1]);
    assert_eq!(
        a.unique().values(),
        vec![Value::from(3), Value::from(1), Value::from(2)]
    );
}

#[test]
fn sort_is_stable_with_identifier_tie_break() {
    let a = Array::from_values(vec![
        Value::from("b"),
        Value::from(2),
        Value::from("a"),
        Value::from(1),
    ]);
    let sorted = a.sort();
    // Integers order before strings by type identifier; each kind is
    // ordered internally.
    assert_eq!(
        sorted.values(),
        vec![
            Value::from(1),
            Value::from(2),
            Value::from("a"),
            Value::from("b")
        ]
    );
}

#[test]
fn flatten_recurses() {
    let a = Array::from_values(vec![
        Value::from(1),
        Value::array(vec![Value::from(2), Value::array(vec![Value::from(3)])]),
    ]);
    assert_eq!(
        a.flatten().values(),
        vec![Value::from(1), Value::from(2), Value::from(3)]
    );
}

#[test]
fn slice_copies_the_spine() {
    let a = ints(&[1, 2, 3]);
    let s = a.slice(1, 3);
    assert_eq!(s.values(), vec![Value::from(2), Value::from(3)]);
    a.set(1, Value::from(9)).unwrap();
    assert_eq!(s.get(0), Some(Value::from(2)));
}

#[test]
fn to_map_pairs_successive_elements() {
    let a = Array::from_values(vec![
        Value::from("a"),
        Value::from(1),
        Value::from("b"),
    ]);
    let m = a.to_map();
    assert_eq!(m.get(&Value::from("a")), Some(Value::from(1)));
    assert_eq!(m.get(&Value::from("b")), Some(Value::Nil));
    assert_eq!(m.len(), 2);
}

#[test]
fn to_map_from_entries_accepts_entries_and_pairs() {
    let a = Array::from_values(vec![
        Value::entry(Value::from("a"), Value::from(1)),
        Value::array(vec![Value::from("b"), Value::from(2)]),
    ]);
    let m = a.to_map_from_entries().unwrap();
    assert_eq!(m.get(&Value::from("b")), Some(Value::from(2)));

    let bad = Array::from_values(vec![Value::from(1)]);
    assert!(bad.to_map_from_entries().is_none());
}

#[test]
fn equality_is_order_dependent() {
    assert_eq!(ints(&[1, 2]), ints(&[1, 2]));
    assert_ne!(ints(&[1, 2]), ints(&[2, 1]));
}
