//! Cross-type total order over variants.

use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    matrix::{hash_real, real_order},
    policy::raise,
    scalar::compare_integer_real,
    variant::{ValueType, Variant, exact_integer},
};

/// Numeric projection of a scalar: Booleans become 0/1 and Complex values
/// project to `real + imag`.
#[derive(Debug, Clone, Copy)]
enum Projection {
    Integer(i64),
    Real(f64),
}

fn project(value: &Variant) -> Option<Projection> {
    match value {
        Variant::Boolean(v) => Some(Projection::Integer(*v as i64)),
        Variant::Integer(v) => Some(Projection::Integer(*v)),
        Variant::Real(v) => Some(Projection::Real(*v)),
        Variant::Complex(v) => Some(Projection::Real(v.ordering_projection())),
        _ => None,
    }
}

fn compare_projections(a: Projection, b: Projection) -> Ordering {
    match (a, b) {
        (Projection::Integer(x), Projection::Integer(y)) => x.cmp(&y),
        (Projection::Real(x), Projection::Real(y)) => real_order(x, y),
        (Projection::Integer(x), Projection::Real(y)) => {
            compare_integer_real(x, y).unwrap_or(Ordering::Less)
        }
        (Projection::Real(x), Projection::Integer(y)) => {
            compare_integer_real(y, x).map_or(Ordering::Greater, Ordering::reverse)
        }
    }
}

/// Orders two tags that have no dedicated comparison. Equal tags have no
/// meaningful fallback and raise `InvalidParameterValue`.
pub fn fallback_ordering(a: ValueType, b: ValueType) -> RuntimeResult<Ordering> {
    if a == b {
        return raise(
            RuntimeError::invalid_parameter(format!("no ordering defined for {} values", a)),
            Ordering::Equal,
        );
    }
    Ok(a.cmp(&b))
}

/// Total order across every pair of variant types.
///
/// Numeric scalars compare by their projections, with NaN above every number
/// and equal to itself. Values of the same container tag compare with that
/// container's `relative_order`. Everything else orders by tag.
pub fn implicit_ordering(a: &Variant, b: &Variant) -> Ordering {
    if let (Some(x), Some(y)) = (project(a), project(b)) {
        return compare_projections(x, y);
    }
    match (a, b) {
        (Variant::None, Variant::None) => Ordering::Equal,
        (Variant::Set(x), Variant::Set(y)) => x.relative_order(y),
        (Variant::Tuple(x), Variant::Tuple(y)) => x.relative_order(y),
        (Variant::MatrixBoolean(x), Variant::MatrixBoolean(y)) => x.relative_order(y),
        (Variant::MatrixInteger(x), Variant::MatrixInteger(y)) => x.relative_order(y),
        (Variant::MatrixReal(x), Variant::MatrixReal(y)) => x.relative_order(y),
        (Variant::MatrixComplex(x), Variant::MatrixComplex(y)) => x.relative_order(y),
        _ => match fallback_ordering(a.value_type(), b.value_type()) {
            Ok(ordering) => ordering,
            Err(_) => Ordering::Equal,
        },
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        implicit_ordering(self, other) == Ordering::Equal
    }
}

impl Eq for Variant {}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        implicit_ordering(self, other)
    }
}

/// Hash class shared by every numeric scalar.
const NUMERIC_TAG: u8 = 0xff;

impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(projection) = project(self) {
            NUMERIC_TAG.hash(state);
            match projection {
                Projection::Integer(v) => v.hash(state),
                Projection::Real(v) => hash_projected_real(v, state),
            }
            return;
        }
        (self.value_type() as u8).hash(state);
        match self {
            Variant::Set(set) => {
                set.len().hash(state);
                for value in set.iter() {
                    value.hash(state);
                }
            }
            Variant::Tuple(tuple) => {
                tuple.len().hash(state);
                for value in tuple.iter() {
                    value.hash(state);
                }
            }
            Variant::MatrixBoolean(m) => m.hash_into(state),
            Variant::MatrixInteger(m) => m.hash_into(state),
            Variant::MatrixReal(m) => m.hash_into(state),
            Variant::MatrixComplex(m) => m.hash_into(state),
            _ => {}
        }
    }
}

/// Integral reals inside the i64 range hash like the equal Integer.
fn hash_projected_real<H: Hasher>(value: f64, state: &mut H) {
    match exact_integer(value) {
        Some(integer) => integer.hash(state),
        None => hash_real(value, state),
    }
}
