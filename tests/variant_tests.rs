use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use ferrite::runtime::{
    containers::{OrderedSet, Tuple},
    matrix::{MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal},
    scalar::Complex,
    variant::{ValueType, Variant, implicit_ordering},
};
use proptest::prelude::*;

fn hash_of(value: &Variant) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Scalars drawn from a small range so that values of different tags often
/// compare equal.
fn scalar() -> impl Strategy<Value = Variant> {
    prop_oneof![
        Just(Variant::None),
        any::<bool>().prop_map(Variant::Boolean),
        (-20i64..20).prop_map(Variant::Integer),
        (-40i32..40).prop_map(|v| Variant::Real(f64::from(v) / 2.0)),
        Just(Variant::Real(f64::NAN)),
        ((-10i32..10), (-4i32..4)).prop_map(|(re, im)| {
            Variant::Complex(Complex::new(f64::from(re), f64::from(im) / 2.0))
        }),
    ]
}

fn matrix() -> impl Strategy<Value = Variant> {
    (0usize..3, 0usize..3).prop_flat_map(|(rows, columns)| {
        prop::collection::vec(-3i64..3, rows * columns).prop_map(move |values| {
            let m = MatrixInteger::build(rows, columns, values).unwrap();
            match rows % 3 {
                0 => Variant::MatrixInteger(m),
                1 => Variant::MatrixReal(m.map(|v| v as f64)),
                _ => Variant::MatrixComplex(m.map(|v| Complex::from_real(v as f64))),
            }
        })
    })
}

/// Matrices without elements, which differ only by shape.
fn empty_matrix() -> impl Strategy<Value = Variant> {
    (0usize..4, any::<bool>()).prop_map(|(extent, tall)| {
        let (rows, columns) = if tall { (extent, 0) } else { (0, extent) };
        Variant::MatrixReal(MatrixReal::new(rows, columns))
    })
}

fn variant() -> impl Strategy<Value = Variant> {
    let leaf = prop_oneof![4 => scalar(), 1 => matrix(), 1 => empty_matrix()];
    leaf.prop_recursive(2, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3)
                .prop_map(|items| Variant::Set(items.into_iter().collect::<OrderedSet>())),
            prop::collection::vec(inner, 0..3)
                .prop_map(|items| Variant::Tuple(items.into_iter().collect::<Tuple>())),
        ]
    })
}

proptest! {
    #[test]
    fn ordering_is_antisymmetric(a in variant(), b in variant()) {
        prop_assert_eq!(implicit_ordering(&a, &b), implicit_ordering(&b, &a).reverse());
    }

    #[test]
    fn ordering_is_transitive(a in variant(), b in variant(), c in variant()) {
        let mut values = [a, b, c];
        values.sort();
        prop_assert_ne!(implicit_ordering(&values[0], &values[2]), Ordering::Greater);
        prop_assert_ne!(implicit_ordering(&values[0], &values[1]), Ordering::Greater);
        prop_assert_ne!(implicit_ordering(&values[1], &values[2]), Ordering::Greater);
    }

    #[test]
    fn equal_values_hash_alike(a in variant(), b in variant()) {
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    #[test]
    fn empty_matrices_are_equal_only_with_the_same_shape(a in empty_matrix(), b in empty_matrix()) {
        let same_shape = match (&a, &b) {
            (Variant::MatrixReal(x), Variant::MatrixReal(y)) => x.shape() == y.shape(),
            _ => unreachable!(),
        };
        prop_assert_eq!(a == b, same_shape);
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    #[test]
    fn converting_to_the_own_type_is_identity(a in variant()) {
        let (converted, ok) = a.convert_checked(a.value_type());
        prop_assert!(ok);
        prop_assert_eq!(converted.value_type(), a.value_type());
        prop_assert_eq!(converted, a);
    }

    #[test]
    fn sets_hold_each_value_once(items in prop::collection::vec(scalar(), 0..12)) {
        let set: OrderedSet = items.iter().cloned().collect();
        for item in &items {
            prop_assert!(set.contains(item));
        }
        let members = set.to_vec();
        for pair in members.windows(2) {
            prop_assert_eq!(implicit_ordering(&pair[0], &pair[1]), Ordering::Less);
        }
    }
}

#[test]
fn complex_narrowing_depends_on_the_imaginary_part() {
    let v = Variant::Complex(Complex::new(2.0, 0.0));
    assert_eq!(v.to_integer_checked(), (2, true));
    assert_eq!(v.to_boolean_checked(), (true, true));

    let v = Variant::Complex(Complex::new(2.0, 1.0));
    assert_eq!(v.to_integer_checked(), (0, false));
    assert!(v.convert(ValueType::Real).is_err());
}

#[test]
fn empty_values_of_every_tag_ascend() {
    let chain = [
        Variant::None,
        Variant::Boolean(false),
        Variant::Integer(1),
        Variant::Real(1.5),
        Variant::Complex(Complex::new(2.0, 0.25)),
        Variant::Set(OrderedSet::new()),
        Variant::Tuple(Tuple::new()),
        Variant::MatrixBoolean(MatrixBoolean::default()),
        Variant::MatrixInteger(MatrixInteger::default()),
        Variant::MatrixReal(MatrixReal::default()),
        Variant::MatrixComplex(MatrixComplex::default()),
    ];
    for pair in chain.windows(2) {
        assert!(pair[0] < pair[1], "{:?} < {:?}", pair[0], pair[1]);
    }
}
