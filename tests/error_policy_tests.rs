//! The error policy is process-wide, so every test here holds `SERIAL` and
//! restores the default flags when it ends.

use ferrite::config::RuntimeConfig;
use ferrite::runtime::{
    conversion::{inline_to_integer, real_to_integer},
    error::{ErrorClass, RuntimeError},
    file_io::{FileMode, FileTable},
    matrix::MatrixInteger,
    policy::policy,
    scalar::Complex,
    summation::{Bound, summation},
    variant::{ValueType, Variant, arith},
};
use parking_lot::{Mutex, MutexGuard};
use tempfile::TempDir;

static SERIAL: Mutex<()> = Mutex::new(());

struct Restore {
    _serial: MutexGuard<'static, ()>,
}

impl Drop for Restore {
    fn drop(&mut self) {
        policy().enable_all();
    }
}

fn exclusive() -> Restore {
    let guard = SERIAL.lock();
    policy().enable_all();
    Restore { _serial: guard }
}

#[test]
fn disabled_file_errors_yield_sentinels() {
    let _policy = exclusive();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.txt");
    let mut files = FileTable::new();

    assert!(matches!(
        files.open(&missing, FileMode::Read),
        Err(RuntimeError::FileOpenError { .. })
    ));

    policy().set_enabled(ErrorClass::File, false);
    assert_eq!(files.open(&missing, FileMode::Read), Ok(0));
    assert_eq!(files.open(dir.path().join("x.unknown"), FileMode::Write), Ok(0));
    assert_eq!(files.close(17), Ok(false));
    assert!(files.is_empty());
}

#[test]
fn disabled_conversions_yield_the_target_zero() {
    let _policy = exclusive();
    let value = Variant::Complex(Complex::new(1.0, 1.0));
    assert_eq!(
        value.convert(ValueType::Integer),
        Err(RuntimeError::type_conversion(ValueType::Complex, ValueType::Integer))
    );

    policy().set_enabled(ErrorClass::TypeConversion, false);
    assert_eq!(value.convert(ValueType::Integer), Ok(Variant::Integer(0)));
    assert_eq!(inline_to_integer(&Variant::Real(2.5)), Ok(0));
    assert!(!policy().set_enabled(ErrorClass::TypeConversion, true));
}

#[test]
fn nan_and_infinity_classes_are_independent() {
    let _policy = exclusive();
    policy().set_enabled(ErrorClass::NaN, false);
    assert_eq!(real_to_integer(f64::NAN), Ok(0));
    assert_eq!(real_to_integer(f64::INFINITY), Err(RuntimeError::ResultIsInfinite));
    assert_eq!(
        arith::divide(&Variant::Integer(1), &Variant::Integer(0)),
        Err(RuntimeError::ResultIsInfinite)
    );

    policy().set_enabled(ErrorClass::Infinity, false);
    assert_eq!(
        arith::divide(&Variant::Integer(1), &Variant::Integer(0)),
        Ok(Variant::Integer(0))
    );
}

#[test]
fn non_convergence_returns_nan_when_disabled() {
    let _policy = exclusive();
    policy().set_enabled(ErrorClass::Convergence, false);
    let sum: f64 = summation(Bound::Finite(1), Bound::PositiveInfinity, |k| {
        Ok(if k % 2 == 0 { 1.0 } else { 2.0 })
    })
    .unwrap();
    assert!(sum.is_nan());
}

#[test]
fn dimension_errors_are_never_suppressed() {
    let _policy = exclusive();
    policy().disable_all();
    let a = Variant::MatrixInteger(MatrixInteger::new(2, 3));
    let b = Variant::MatrixInteger(MatrixInteger::new(2, 3));
    assert!(matches!(
        arith::multiply(&a, &b),
        Err(RuntimeError::IncompatibleMatrixDimensions { .. })
    ));
}

#[test]
fn configuration_installs_the_flags() {
    let _policy = exclusive();
    let config = RuntimeConfig::from_json_str(r#"{ "errors": { "file": false, "nan": false } }"#).unwrap();
    config.apply();
    assert!(!policy().is_enabled(ErrorClass::File));
    assert!(!policy().is_enabled(ErrorClass::NaN));
    assert!(policy().is_enabled(ErrorClass::Convergence));
}
