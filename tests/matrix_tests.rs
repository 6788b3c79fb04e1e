use ferrite::runtime::{
    error::RuntimeError,
    matrix::{Matrix, MatrixInteger, MatrixReal, PARALLEL_THRESHOLD, Selector},
    scalar::Complex,
    variant::{Variant, arith},
};

fn ints(rows: &[&[i64]]) -> MatrixInteger {
    Matrix::from_rows(rows).unwrap()
}

#[test]
fn mismatched_product_reports_both_shapes() {
    let a = Variant::MatrixInteger(MatrixInteger::new(10, 11));
    let b = Variant::MatrixInteger(MatrixInteger::new(12, 13));
    let err = arith::multiply(&a, &b).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::IncompatibleMatrixDimensions {
            multiplier_rows: 10,
            multiplier_columns: 11,
            multiplicand_rows: 12,
            multiplicand_columns: 13,
        }
    );
    assert_eq!(
        err.to_string(),
        "incompatible matrix dimensions: 10x11 and 12x13"
    );
}

#[test]
fn mixed_element_types_promote() {
    let a = Variant::MatrixInteger(ints(&[&[1, 2], &[3, 4]]));
    let b = Variant::MatrixReal(MatrixReal::from_rows(&[&[0.5], &[0.25]]).unwrap());
    let product = arith::multiply(&a, &b).unwrap();
    assert_eq!(
        product,
        Variant::MatrixReal(MatrixReal::from_rows(&[&[1.0], &[2.5]]).unwrap())
    );

    let scaled = arith::multiply(&Variant::Complex(Complex::I), &a).unwrap();
    match scaled {
        Variant::MatrixComplex(m) => assert_eq!(m.get(1, 0), Complex::new(0.0, 3.0)),
        other => panic!("expected a complex matrix, got {other}"),
    }
}

#[test]
fn fibonacci_by_matrix_power() {
    let q = ints(&[&[1, 1], &[1, 0]]);
    let q30 = q.power(30).unwrap();
    assert_eq!(q30.get(0, 1), 832_040);
    assert_eq!(q.power(0).unwrap(), MatrixInteger::identity(2, None));
}

#[test]
fn slicing_through_variant_selectors() {
    let m = Matrix::from_fn(4, 3, |r, c| (10 * (r + 1) + c + 1) as i64);
    let rows = Selector::from_variant(&Variant::Integer(2)).unwrap();
    let picked = m.at_selectors(&rows, &Selector::All).unwrap();
    assert_eq!(picked.to_string(), "[[21], [22], [23]]");

    let corner = m
        .at_selectors(&Selector::Index(4), &Selector::Index(3))
        .unwrap();
    assert_eq!(corner, Variant::Integer(43));
}

#[test]
fn parallel_and_serial_products_agree() {
    let side = (PARALLEL_THRESHOLD as f64).cbrt().ceil() as usize + 1;
    let a = Matrix::from_fn(side, side, |r, c| ((r * 7 + c * 3) % 11) as i64 - 5);
    let b = Matrix::from_fn(side, side, |r, c| ((r * 5 + c) % 13) as i64 - 6);
    let product = a.multiply(&b).unwrap();

    for (r, c) in [(0, 0), (side - 1, 0), (side / 2, side - 1)] {
        let expected: i64 = (0..side).map(|k| a.get(r, k) * b.get(k, c)).sum();
        assert_eq!(product.get(r, c), expected);
    }
}

#[test]
fn shared_storage_survives_updates() {
    let original = ints(&[&[1, 2], &[3, 4]]);
    let mut copy = original.clone();
    copy.update(1, 1, 9).unwrap();
    assert_eq!(original.get(0, 0), 1);
    assert_eq!(copy.get(0, 0), 9);
}
