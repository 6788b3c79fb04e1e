use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use insta::assert_snapshot;

use crate::runtime::{
    containers::{OrderedSet, Tuple},
    error::RuntimeError,
    matrix::{MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal},
    scalar::Complex,
    variant::{ValueType, Variant, fallback_ordering, implicit_ordering},
};

fn hash_of(value: &Variant) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn one_of_each_tag() -> Vec<Variant> {
    vec![
        Variant::None,
        Variant::Boolean(true),
        Variant::Integer(5),
        Variant::Real(7.5),
        Variant::Complex(Complex::new(8.0, 1.0)),
        Variant::Set([1, 2].into_iter().map(Variant::Integer).collect()),
        Variant::Tuple(Tuple::from("xy")),
        Variant::MatrixBoolean(MatrixBoolean::new(1, 1)),
        Variant::MatrixInteger(MatrixInteger::new(1, 1)),
        Variant::MatrixReal(MatrixReal::new(1, 1)),
        Variant::MatrixComplex(MatrixComplex::new(1, 1)),
    ]
}

#[test]
fn tags_form_a_strictly_ascending_chain() {
    let values = one_of_each_tag();
    for pair in values.windows(2) {
        assert_eq!(
            implicit_ordering(&pair[0], &pair[1]),
            Ordering::Less,
            "{} < {}",
            pair[0].value_type(),
            pair[1].value_type()
        );
        assert_eq!(implicit_ordering(&pair[1], &pair[0]), Ordering::Greater);
    }
}

#[test]
fn numeric_scalars_compare_across_tags() {
    assert_eq!(Variant::Integer(2), Variant::Real(2.0));
    assert_eq!(Variant::Integer(2), Variant::Complex(Complex::new(1.0, 1.0)));
    assert_eq!(Variant::Boolean(true), Variant::Integer(1));
    assert!(Variant::Integer(3) > Variant::Real(2.5));
    assert!(Variant::Real(-0.5) < Variant::Boolean(false));
    assert_eq!(Variant::Real(-0.0), Variant::Integer(0));
}

#[test]
fn integer_real_comparison_is_exact_near_two_pow_53() {
    let big = (1_i64 << 53) + 1;
    assert!(Variant::Integer(big) > Variant::Real((1_i64 << 53) as f64));
    assert!(Variant::Integer(i64::MAX) < Variant::Real(9.3e18));
}

#[test]
fn nan_sorts_above_numbers_and_equals_itself() {
    let nan = Variant::Real(f64::NAN);
    assert!(nan > Variant::Real(f64::INFINITY));
    assert!(nan > Variant::Integer(i64::MAX));
    assert_eq!(nan, Variant::Real(f64::NAN));
    assert_eq!(nan, Variant::Complex(Complex::new(f64::NAN, 0.0)));
    assert!(nan < Variant::Set(OrderedSet::new()));
}

#[test]
fn equal_values_hash_alike() {
    let twos = [
        Variant::Integer(2),
        Variant::Real(2.0),
        Variant::Complex(Complex::new(1.0, 1.0)),
    ];
    let expected = hash_of(&twos[0]);
    for value in &twos {
        assert_eq!(hash_of(value), expected, "{:?}", value);
    }
    assert_eq!(hash_of(&Variant::Boolean(true)), hash_of(&Variant::Integer(1)));
    assert_eq!(
        hash_of(&Variant::Real(f64::NAN)),
        hash_of(&Variant::Real(-f64::NAN))
    );
    assert_eq!(hash_of(&Variant::Real(0.0)), hash_of(&Variant::Real(-0.0)));
}

#[test]
fn containers_use_their_own_order() {
    let short = Variant::Tuple(Tuple::from("ab"));
    let long = Variant::Tuple(Tuple::from("abc"));
    let later = Variant::Tuple(Tuple::from("b"));
    assert!(short < long);
    assert!(long < later);

    let a = MatrixInteger::from_rows(&[&[1, 2]]).unwrap();
    let b = MatrixInteger::from_rows(&[&[1, 3]]).unwrap();
    assert!(Variant::MatrixInteger(a) < Variant::MatrixInteger(b));
}

#[test]
fn fallback_orders_distinct_tags() {
    assert_eq!(
        fallback_ordering(ValueType::Set, ValueType::Tuple),
        Ok(Ordering::Less)
    );
    assert!(matches!(
        fallback_ordering(ValueType::Tuple, ValueType::Tuple),
        Err(RuntimeError::InvalidParameterValue(_))
    ));
}

#[test]
fn display_forms() {
    let set: OrderedSet = [3, 1, 2].into_iter().map(Variant::Integer).collect();
    assert_snapshot!(Variant::Set(set).to_string(), @"{1, 2, 3}");

    let tuple = Tuple::from_vec(vec![
        Variant::Boolean(true),
        Variant::Real(0.5),
        Variant::None,
    ]);
    assert_snapshot!(Variant::Tuple(tuple).to_string(), @"(true, 0.5, None)");

    let matrix = MatrixInteger::from_rows(&[&[1, 2], &[3, 4]]).unwrap();
    assert_snapshot!(Variant::MatrixInteger(matrix).to_string(), @"[[1, 3], [2, 4]]");
}
