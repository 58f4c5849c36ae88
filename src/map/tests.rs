use super::*;
use crate::array::Array;
use crate::error::ErrorKind;
use crate::ty::StructMapEntry;

fn pairs(entries: &[(&str, i64)]) -> Vec<(Value, Value)> {
    entries
        .iter()
        .map(|(k, v)| (Value::from(*k), Value::from(*v)))
        .collect()
}

#[test]
fn put_get_remove() {
    let m = Map::new();
    assert_eq!(m.put(Value::from("a"), Value::from(1)).unwrap(), None);
    assert_eq!(
        m.put(Value::from("a"), Value::from(2)).unwrap(),
        Some(Value::from(1))
    );
    assert_eq!(m.get(&Value::from("a")), Some(Value::from(2)));
    assert_eq!(m.get(&Value::from("b")), None);
    assert_eq!(m.remove(&Value::from("a")).unwrap(), Some(Value::from(2)));
    assert_eq!(m.remove(&Value::from("a")).unwrap(), None);
    assert!(m.is_empty());
}

#[test]
fn iteration_follows_insertion_order() {
    let m = Map::from_pairs(pairs(&[("b", 1), ("a", 2), ("c", 3)]));
    let keys: Vec<Value> = m.keys().values();
    assert_eq!(
        keys,
        vec![Value::from("b"), Value::from("a"), Value::from("c")]
    );
    // Overwriting keeps the original position.
    m.put(Value::from("a"), Value::from(9)).unwrap();
    assert_eq!(m.keys().values()[1], Value::from("a"));
    // Remove and re-add moves to the back.
    m.remove(&Value::from("b")).unwrap();
    m.put(Value::from("b"), Value::from(1)).unwrap();
    assert_eq!(m.keys().values().last(), Some(&Value::from("b")));
}

#[test]
fn survives_rehashing() {
    let m = Map::new();
    for i in 0..100 {
        m.put(Value::from(i), Value::from(i * 2)).unwrap();
    }
    assert_eq!(m.len(), 100);
    for i in 0..100 {
        assert_eq!(m.get(&Value::from(i)), Some(Value::from(i * 2)));
    }
    let keys: Vec<Value> = m.keys().values();
    assert_eq!(keys[0], Value::from(0));
    assert_eq!(keys[99], Value::from(99));
}

#[test]
fn non_string_keys_are_fine() {
    let m = Map::new();
    m.put(Value::from(1), Value::from("one")).unwrap();
    m.put(Value::array(vec![Value::from(1)]), Value::from("list"))
        .unwrap();
    assert_eq!(m.get(&Value::from(1)), Some(Value::from("one")));
    assert_eq!(
        m.get(&Value::array(vec![Value::from(1)])),
        Some(Value::from("list"))
    );
}

#[test]
fn keys_are_stored_frozen() {
    let key = Array::from_values(vec![Value::from(1)]);
    let m = Map::new();
    m.put(Value::Array(key.clone()), Value::from("v")).unwrap();
    // The caller's array is untouched; the stored key is a frozen copy.
    assert!(!key.is_frozen());
    let stored = m.keys().get(0).unwrap();
    assert!(stored.is_frozen());
    key.add(Value::from(2)).unwrap();
    assert_eq!(m.get(&Value::array(vec![Value::from(1)])), Some(Value::from("v")));
}

#[test]
fn equality_is_order_independent() {
    let a = Map::from_pairs(pairs(&[("x", 1), ("y", 2)]));
    let b = Map::from_pairs(pairs(&[("y", 2), ("x", 1)]));
    assert_eq!(a, b);
    assert_eq!(
        Value::Map(a.clone()).hash_code(),
        Value::Map(b.clone()).hash_code()
    );
    assert_ne!(a, Map::from_pairs(pairs(&[("x", 1)])));
    assert_ne!(a, Map::from_pairs(pairs(&[("x", 1), ("y", 3)])));
}

#[test]
fn entries_and_each() {
    let m = Map::from_pairs(pairs(&[("a", 1), ("b", 2)]));
    let entries = m.entries();
    assert_eq!(entries.len(), 2);
    let first = entries.get(0).unwrap();
    let entry = first.as_entry().unwrap();
    assert_eq!(entry.key(), &Value::from("a"));
    assert_eq!(entry.value(), &Value::from(1));

    let mut seen = Vec::new();
    m.each(|k, v| seen.push((k.clone(), v.clone())));
    assert_eq!(seen.len(), 2);
    let mut sum = 0;
    m.each_value(|v| sum += v.as_integer().unwrap());
    assert_eq!(sum, 3);
}

#[test]
fn frozen_maps_reject_mutation() {
    let m = Map::from_pairs(pairs(&[("a", 1)]));
    m.freeze().unwrap();
    for err in [
        m.put(Value::from("b"), Value::from(2)).unwrap_err(),
        m.remove(&Value::from("a")).unwrap_err(),
        m.set_type(None).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::FrozenMutation);
    }
    assert_eq!(m.len(), 1);
}

#[test]
fn freeze_recurses_into_values() {
    let inner = Array::from_values(vec![Value::from(1)]);
    let m = Map::from_pairs(vec![(Value::from("a"), Value::Array(inner.clone()))]);
    m.freeze().unwrap();
    assert!(inner.is_frozen());
}

#[test]
fn frozen_copy_is_isolated() {
    let m = Map::from_pairs(pairs(&[("a", 1)]));
    let frozen = m.frozen_copy().unwrap();
    m.put(Value::from("b"), Value::from(2)).unwrap();
    assert_eq!(frozen.len(), 1);
    assert!(frozen.is_frozen());
    assert_eq!(frozen.frozen_copy().unwrap().identity(), frozen.identity());
}

#[test]
fn with_and_without_leave_the_receiver_alone() {
    let m = Map::from_pairs(pairs(&[("a", 1)]));
    m.freeze().unwrap();
    let bigger = m.with(Value::from("b"), Value::from(2)).unwrap();
    assert_eq!(m.len(), 1);
    assert_eq!(bigger.len(), 2);
    assert!(bigger.is_frozen());
    let smaller = bigger.without(&Value::from("a")).unwrap();
    assert_eq!(smaller.len(), 1);
    assert!(smaller.is_frozen());
}

#[test]
fn sized_map_types_check_pairs_and_bounds() {
    let t = Type::map_sized(Type::string(), Type::integer(), 0, 2);
    let m = Map::typed(t).unwrap();
    m.put(Value::from("a"), Value::from(1)).unwrap();

    let err = m.put(Value::from(1), Value::from(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);
    let err = m.put(Value::from("b"), Value::from("x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);

    m.put(Value::from("b"), Value::from(2)).unwrap();
    let err = m.put(Value::from("c"), Value::from(3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalSize);
    // Overwrites do not grow the map.
    m.put(Value::from("a"), Value::from(9)).unwrap();
}

#[test]
fn sized_map_types_enforce_minimum_on_removal() {
    let t = Type::map_sized(Type::string(), Type::integer(), 1, 9);
    let m = Map::new();
    m.put(Value::from("a"), Value::from(1)).unwrap();
    m.set_type(Some(t)).unwrap();
    let err = m.remove(&Value::from("a")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalSize);
}

fn person() -> Type {
    Type::struct_map(
        vec![
            StructMapEntry::named("name", Type::string(), true),
            StructMapEntry::named("age", Type::integer(), false),
        ],
        false,
    )
    .unwrap()
}

#[test]
fn struct_map_types_check_entries_on_put() {
    let m = Map::typed(person()).unwrap();
    m.put(Value::from("name"), Value::from("ada")).unwrap();

    let err = m.put(Value::from("name"), Value::from(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);
    let err = m.put(Value::from("x"), Value::from(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);
}

#[test]
fn struct_map_required_entries_are_checked_at_freeze() {
    let m = Map::typed(person()).unwrap();
    m.put(Value::from("age"), Value::from(30)).unwrap();
    let err = m.freeze().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeAssertion);
    assert!(!m.is_frozen());

    m.put(Value::from("name"), Value::from("ada")).unwrap();
    m.freeze().unwrap();
    assert!(m.is_frozen());
}

#[test]
fn set_type_checks_present_entries_only() {
    let m = Map::from_pairs(pairs(&[("name", 1)]));
    // Present entry has the wrong value type.
    let err = m.set_type(Some(person())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalAssignment);

    let m = Map::new();
    // Missing required entries are tolerated until finalization.
    m.set_type(Some(person())).unwrap();

    let err = m.set_type(Some(Type::integer())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeAssertion);
}

#[test]
fn put_all_preserves_order() {
    let a = Map::from_pairs(pairs(&[("a", 1)]));
    let b = Map::from_pairs(pairs(&[("b", 2), ("c", 3)]));
    a.put_all(&b).unwrap();
    assert_eq!(
        a.keys().values(),
        vec![Value::from("a"), Value::from("b"), Value::from("c")]
    );
}

#[test]
fn remove_all_removes_every_key() {
    let m = Map::from_pairs(pairs(&[("a", 1), ("b", 2), ("c", 3)]));
    m.remove_all(&Array::from_values(vec![Value::from("a"), Value::from("c")]))
        .unwrap();
    assert_eq!(m.keys().values(), vec![Value::from("b")]);
}

#[test]
fn untyped_maps_have_exact_types() {
    let m = Map::from_pairs(pairs(&[("a", 1)]));
    let t = m.type_of();
    assert!(t.instance(&Value::Map(m.clone())));
    assert!(!t.instance(&Value::Map(Map::new())));
}

#[test]
fn display_follows_insertion_order() {
    let m = Map::from_pairs(pairs(&[("b", 1), ("a", 2)]));
    assert_eq!(m.to_string(), "{\"b\": 1, \"a\": 2}");
}
