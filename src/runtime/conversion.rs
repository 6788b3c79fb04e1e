//! Inline conversion helpers called by compiled code.
//!
//! Each helper reduces a variant to a scalar under the conversion table and
//! the error policy: unrepresentable values raise `TypeConversion`, or yield
//! the zero value when that class is disabled.

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    scalar::Complex,
    variant::{ValueType, Variant, exact_integer},
};

fn gated<T>(value: &Variant, target: ValueType, (result, ok): (T, bool)) -> RuntimeResult<T> {
    if ok {
        Ok(result)
    } else {
        raise(
            RuntimeError::type_conversion(value.value_type(), target),
            result,
        )
    }
}

pub fn inline_to_boolean(value: &Variant) -> RuntimeResult<bool> {
    gated(value, ValueType::Boolean, value.to_boolean_checked())
}

pub fn inline_to_integer(value: &Variant) -> RuntimeResult<i64> {
    match value {
        Variant::Real(v) => real_to_integer(*v),
        Variant::Complex(c) if c.imag == 0.0 => real_to_integer(c.real),
        _ => gated(value, ValueType::Integer, value.to_integer_checked()),
    }
}

pub fn inline_to_real(value: &Variant) -> RuntimeResult<f64> {
    gated(value, ValueType::Real, value.to_real_checked())
}

/// Keeps the imaginary part of Complex inputs.
pub fn inline_to_complex(value: &Variant) -> RuntimeResult<Complex> {
    gated(value, ValueType::Complex, value.to_complex_checked())
}

/// Converts a Real holding an integral value. NaN raises `ResultIsNaN`,
/// infinities raise `ResultIsInfinite` and fractional or out-of-range values
/// raise `TypeConversion(Real → Integer)`; each falls back to 0.
pub fn real_to_integer(value: f64) -> RuntimeResult<i64> {
    if value.is_nan() {
        return raise(RuntimeError::ResultIsNaN, 0);
    }
    if value.is_infinite() {
        return raise(RuntimeError::ResultIsInfinite, 0);
    }
    match exact_integer(value) {
        Some(integer) => Ok(integer),
        None => raise(
            RuntimeError::type_conversion(ValueType::Real, ValueType::Integer),
            0,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::containers::{OrderedSet, Tuple};

    #[test]
    fn booleans_follow_nonzero_and_nonempty() {
        assert!(inline_to_boolean(&Variant::Integer(-3)).unwrap());
        assert!(!inline_to_boolean(&Variant::Real(0.0)).unwrap());
        assert!(inline_to_boolean(&Variant::Complex(Complex::new(0.0, 1e-300))).unwrap());
        assert!(!inline_to_boolean(&Variant::Set(OrderedSet::new())).unwrap());
        assert!(inline_to_boolean(&Variant::Tuple(Tuple::from("x"))).unwrap());
        assert!(!inline_to_boolean(&Variant::None).unwrap());
    }

    #[test]
    fn integers_require_integral_values() {
        assert_eq!(inline_to_integer(&Variant::Real(-4.0)).unwrap(), -4);
        assert_eq!(
            inline_to_integer(&Variant::Real(4.5)),
            Err(RuntimeError::type_conversion(
                ValueType::Real,
                ValueType::Integer
            ))
        );
        assert_eq!(
            inline_to_integer(&Variant::Real(f64::NAN)),
            Err(RuntimeError::ResultIsNaN)
        );
        assert_eq!(
            inline_to_integer(&Variant::Complex(Complex::new(f64::INFINITY, 0.0))),
            Err(RuntimeError::ResultIsInfinite)
        );
        assert_eq!(
            inline_to_integer(&Variant::Complex(Complex::new(2.0, 1.0))),
            Err(RuntimeError::type_conversion(
                ValueType::Complex,
                ValueType::Integer
            ))
        );
        assert_eq!(inline_to_integer(&Variant::Boolean(true)).unwrap(), 1);
    }

    #[test]
    fn real_to_integer_range_edges() {
        assert_eq!(real_to_integer(-9_223_372_036_854_775_808.0).unwrap(), i64::MIN);
        assert!(real_to_integer(9_223_372_036_854_775_808.0).is_err());
        assert_eq!(real_to_integer(-0.0).unwrap(), 0);
    }

    #[test]
    fn complex_keeps_imaginary_part() {
        let value = Variant::Complex(Complex::new(1.0, -2.0));
        assert_eq!(inline_to_complex(&value).unwrap(), Complex::new(1.0, -2.0));
        assert_eq!(
            inline_to_complex(&Variant::Integer(3)).unwrap(),
            Complex::from_real(3.0)
        );
        assert!(inline_to_real(&value).is_err());
    }

    #[test]
    fn containers_do_not_reduce_to_numbers() {
        let tuple = Variant::Tuple(Tuple::new());
        assert_eq!(
            inline_to_real(&tuple),
            Err(RuntimeError::type_conversion(ValueType::Tuple, ValueType::Real))
        );
    }
}
