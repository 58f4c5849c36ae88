use super::*;

#[test]
fn factories_and_accessors() {
    assert_eq!(Value::integer(42).as_integer(), Some(42));
    assert_eq!(Value::float(1.5).as_float(), Some(1.5));
    assert_eq!(Value::boolean(true).as_boolean(), Some(true));
    assert_eq!(Value::string("hi").as_str(), Some("hi"));
    assert!(Value::Nil.is_nil());
    assert!(Value::array(vec![]).as_array().is_some());
    assert!(Value::map(vec![]).as_map().is_some());
}

#[test]
fn equality_is_structural() {
    assert_eq!(Value::from(42), Value::from(42));
    assert_ne!(Value::from(42), Value::from(43));
    assert_eq!(Value::from("a"), Value::from("a"));
    assert_eq!(
        Value::array(vec![Value::from(1), Value::from("x")]),
        Value::array(vec![Value::from(1), Value::from("x")])
    );
}

#[test]
fn equality_across_kinds_is_false() {
    assert_ne!(Value::from(1), Value::from(1.0));
    assert_ne!(Value::from(0), Value::from(false));
    assert_ne!(Value::from("1"), Value::from(1));
    assert_ne!(Value::Nil, Value::from(false));
}

#[test]
fn equal_values_hash_equally() {
    let a = Value::array(vec![Value::from("k"), Value::from(7)]);
    let b = Value::array(vec![Value::from("k"), Value::from(7)]);
    assert_eq!(a, b);
    assert_eq!(a.hash_code(), b.hash_code());
}

#[test]
fn values_work_as_hash_keys() {
    use std::collections::HashSet;
    let mut set: HashSet<Value> = HashSet::new();
    set.insert(Value::from(1));
    set.insert(Value::from(2));
    set.insert(Value::from(1));
    assert_eq!(set.len(), 2);
    assert!(set.contains(&Value::from(1)));
}

#[test]
fn type_of_scalars_is_exact() {
    let v = Value::from(3);
    assert!(v.type_of().instance(&v));
    assert!(!v.type_of().instance(&Value::from(4)));

    let s = Value::from("hello");
    assert!(s.type_of().instance(&s));
    assert_eq!(s.type_identifier(), TypeIdentifier::StringExact);
}

#[test]
fn type_of_booleans_and_nil_are_singletons() {
    assert_eq!(Value::from(true).type_of(), Type::true_type());
    assert_eq!(Value::from(false).type_of(), Type::false_type());
    assert_eq!(Value::Nil.type_of(), Type::nil());
}

#[test]
fn exact_round_trip_distinguishes_values() {
    let v = Value::from("a");
    let w = Value::from("b");
    assert_ne!(v.type_of(), w.type_of());
    assert_eq!(v.type_of(), Value::from("a").type_of());
}

#[test]
fn compare_orders_nil_first() {
    assert_eq!(
        Value::Nil.compare_to(&Value::from(1)),
        Some(Ordering::Less)
    );
    assert_eq!(
        Value::from("x").compare_to(&Value::Nil),
        Some(Ordering::Greater)
    );
    assert_eq!(Value::Nil.compare_to(&Value::Nil), Some(Ordering::Equal));
}

#[test]
fn compare_crosses_numeric_kinds() {
    assert_eq!(
        Value::from(1).compare_to(&Value::from(1.5)),
        Some(Ordering::Less)
    );
    assert_eq!(
        Value::from(2.0).compare_to(&Value::from(2)),
        Some(Ordering::Equal)
    );
}

#[test]
fn compare_is_undefined_across_unrelated_kinds() {
    assert_eq!(Value::from("a").compare_to(&Value::from(1)), None);
    assert_eq!(Value::map(vec![]).compare_to(&Value::map(vec![])), None);
}

#[test]
fn compare_arrays_elementwise_then_by_length() {
    let a = Value::array(vec![Value::from(1), Value::from(2)]);
    let b = Value::array(vec![Value::from(1), Value::from(3)]);
    let c = Value::array(vec![Value::from(1)]);
    assert_eq!(a.compare_to(&b), Some(Ordering::Less));
    assert_eq!(a.compare_to(&c), Some(Ordering::Greater));
}

#[test]
fn freeze_is_recursive_and_reported() {
    let inner = Value::array(vec![Value::from(1)]);
    let outer = Value::array(vec![inner.clone()]);
    assert!(!outer.is_frozen());
    outer.freeze().unwrap();
    assert!(outer.is_frozen());
    assert!(inner.is_frozen());
}

#[test]
fn frozen_copy_leaves_receiver_mutable() {
    let v = Value::array(vec![Value::from(1)]);
    let frozen = v.frozen_copy().unwrap();
    assert!(frozen.is_frozen());
    assert!(!v.is_frozen());
    v.as_array().unwrap().add(Value::from(2)).unwrap();
    assert_eq!(frozen.as_array().unwrap().len(), 1);
}

#[test]
fn cyclic_arrays_terminate() {
    let a = Array::new();
    a.add(Value::Array(a.clone())).unwrap();
    let v = Value::Array(a.clone());
    // Equality, hashing and type checks on a self-referential value
    // must all terminate.
    assert_eq!(v, v.clone());
    let _ = v.hash_code();
    assert!(Type::array().instance(&v));
}

#[test]
fn display_forms() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::from(3).to_string(), "3");
    assert_eq!(Value::from(3.0).to_string(), "3.0");
    assert_eq!(Value::from(0.5).to_string(), "0.5");
    assert_eq!(Value::from("hi").to_string(), "\"hi\"");
    assert_eq!(
        Value::array(vec![Value::from(1), Value::from("a")]).to_string(),
        "[1, \"a\"]"
    );
    assert_eq!(
        Value::map(vec![(Value::from("k"), Value::from(1))]).to_string(),
        "{\"k\": 1}"
    );
}

#[test]
fn option_conversion_maps_none_to_nil() {
    assert_eq!(Value::from(Some(3i64)), Value::from(3));
    assert_eq!(Value::from(None::<i64>), Value::Nil);
}
