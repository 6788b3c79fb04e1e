//! Tag-dispatched variant functions: `abs`, `size`, `alphabet`, `conj`,
//! `real` and `imag`.

use std::fmt;

use crate::runtime::{
    containers::{OrderedSet, Tuple},
    error::{RuntimeError, RuntimeResult},
    matrix::{Element, Matrix, MatrixReal},
    policy::raise,
    scalar::Complex,
    variant::{ValueType, Variant},
};

pub type VariantFn = fn(&[Variant]) -> RuntimeResult<Variant>;

#[derive(Clone)]
pub struct VariantFunction {
    pub name: &'static str,
    pub func: VariantFn,
}

impl fmt::Debug for VariantFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VariantFunction({})", self.name)
    }
}

impl PartialEq for VariantFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// All variant functions, looked up by name.
pub static VARIANT_FUNCTIONS: &[VariantFunction] = &[
    VariantFunction {
        name: "abs",
        func: variant_abs,
    },
    VariantFunction {
        name: "size",
        func: variant_size,
    },
    VariantFunction {
        name: "alphabet",
        func: variant_alphabet,
    },
    VariantFunction {
        name: "conj",
        func: variant_conj,
    },
    VariantFunction {
        name: "real",
        func: variant_real,
    },
    VariantFunction {
        name: "imag",
        func: variant_imag,
    },
];

pub fn lookup(name: &str) -> Option<&'static VariantFunction> {
    VARIANT_FUNCTIONS.iter().find(|function| function.name == name)
}

/// Calls a function from [`VARIANT_FUNCTIONS`] by name.
pub fn call(name: &str, args: &[Variant]) -> RuntimeResult<Variant> {
    match lookup(name) {
        Some(function) => (function.func)(args),
        None => Err(RuntimeError::invalid_parameter(format!(
            "unknown function `{}`",
            name
        ))),
    }
}

fn check_arity(args: &[Variant], expected: usize, name: &str, signature: &str) -> RuntimeResult<()> {
    if args.len() != expected {
        return Err(RuntimeError::invalid_parameter(format!(
            "{} expected {} argument(s), got {}\n\nHint:\n  {}",
            name,
            expected,
            args.len(),
            signature
        )));
    }
    Ok(())
}

/// Raises `TypeConversion(from → expected)` with a `None` fallback.
fn unsupported(value: &Variant, expected: ValueType) -> RuntimeResult<Variant> {
    raise(
        RuntimeError::type_conversion(value.value_type(), expected),
        Variant::None,
    )
}

fn real_matrix<T: Element>(matrix: &Matrix<T>, f: impl Fn(T) -> f64) -> Variant {
    Variant::MatrixReal(matrix.map(f))
}

/// Magnitude. Complex values and matrices produce Real results.
pub fn abs(value: &Variant) -> RuntimeResult<Variant> {
    Ok(match value {
        Variant::Boolean(v) => Variant::Integer(*v as i64),
        Variant::Integer(v) => Variant::Integer(v.wrapping_abs()),
        Variant::Real(v) => Variant::Real(v.abs()),
        Variant::Complex(v) => Variant::Real(v.abs()),
        Variant::MatrixBoolean(m) => Variant::MatrixInteger(m.map(|v| v as i64)),
        Variant::MatrixInteger(m) => Variant::MatrixInteger(m.map(i64::wrapping_abs)),
        Variant::MatrixReal(m) => real_matrix(m, f64::abs),
        Variant::MatrixComplex(m) => real_matrix(m, Complex::abs),
        other => return unsupported(other, ValueType::Real),
    })
}

/// Element count of sets and tuples, `(rows, columns)` of matrices, 1 for
/// scalars and 0 for `None`.
pub fn size(value: &Variant) -> Variant {
    fn shape<T: Element>(m: &Matrix<T>) -> Variant {
        Variant::Tuple(Tuple::from_vec(vec![
            Variant::Integer(m.rows() as i64),
            Variant::Integer(m.columns() as i64),
        ]))
    }
    match value {
        Variant::None => Variant::Integer(0),
        Variant::Boolean(_) | Variant::Integer(_) | Variant::Real(_) | Variant::Complex(_) => {
            Variant::Integer(1)
        }
        Variant::Set(set) => Variant::Integer(set.len() as i64),
        Variant::Tuple(tuple) => Variant::Integer(tuple.len() as i64),
        Variant::MatrixBoolean(m) => shape(m),
        Variant::MatrixInteger(m) => shape(m),
        Variant::MatrixReal(m) => shape(m),
        Variant::MatrixComplex(m) => shape(m),
    }
}

/// The set of distinct symbols a value is made of.
pub fn alphabet(value: &Variant) -> OrderedSet {
    fn elements<T: Element>(m: &Matrix<T>) -> OrderedSet {
        m.iter().map(|v| Variant::from(v.to_scalar())).collect()
    }
    match value {
        Variant::None => OrderedSet::new(),
        Variant::Set(set) => set.clone(),
        Variant::Tuple(tuple) => tuple.iter().cloned().collect(),
        Variant::MatrixBoolean(m) => elements(m),
        Variant::MatrixInteger(m) => elements(m),
        Variant::MatrixReal(m) => elements(m),
        Variant::MatrixComplex(m) => elements(m),
        scalar => std::iter::once(scalar.clone()).collect(),
    }
}

pub fn conj(value: &Variant) -> RuntimeResult<Variant> {
    Ok(match value {
        Variant::Complex(v) => Variant::Complex(v.conj()),
        Variant::MatrixComplex(m) => Variant::MatrixComplex(m.conj()),
        Variant::Boolean(_)
        | Variant::Integer(_)
        | Variant::Real(_)
        | Variant::MatrixBoolean(_)
        | Variant::MatrixInteger(_)
        | Variant::MatrixReal(_) => value.clone(),
        other => return unsupported(other, ValueType::Complex),
    })
}

pub fn real(value: &Variant) -> RuntimeResult<Variant> {
    Ok(match value {
        Variant::Complex(v) => Variant::Real(v.real),
        Variant::MatrixComplex(m) => real_matrix(m, |v| v.real),
        Variant::Boolean(_) | Variant::Integer(_) | Variant::Real(_) => {
            Variant::Real(value.to_real_checked().0)
        }
        Variant::MatrixBoolean(_) | Variant::MatrixInteger(_) | Variant::MatrixReal(_) => {
            value.convert(ValueType::MatrixReal)?
        }
        other => return unsupported(other, ValueType::Real),
    })
}

pub fn imag(value: &Variant) -> RuntimeResult<Variant> {
    fn zeros<T: Element>(m: &Matrix<T>) -> Variant {
        Variant::MatrixReal(MatrixReal::new(m.rows(), m.columns()))
    }
    Ok(match value {
        Variant::Complex(v) => Variant::Real(v.imag),
        Variant::MatrixComplex(m) => real_matrix(m, |v| v.imag),
        Variant::Boolean(_) | Variant::Integer(_) | Variant::Real(_) => Variant::Real(0.0),
        Variant::MatrixBoolean(m) => zeros(m),
        Variant::MatrixInteger(m) => zeros(m),
        Variant::MatrixReal(m) => zeros(m),
        other => return unsupported(other, ValueType::Real),
    })
}

fn variant_abs(args: &[Variant]) -> RuntimeResult<Variant> {
    check_arity(args, 1, "abs", "abs(x)")?;
    abs(&args[0])
}

fn variant_size(args: &[Variant]) -> RuntimeResult<Variant> {
    check_arity(args, 1, "size", "size(x)")?;
    Ok(size(&args[0]))
}

fn variant_alphabet(args: &[Variant]) -> RuntimeResult<Variant> {
    check_arity(args, 1, "alphabet", "alphabet(x)")?;
    Ok(Variant::Set(alphabet(&args[0])))
}

fn variant_conj(args: &[Variant]) -> RuntimeResult<Variant> {
    check_arity(args, 1, "conj", "conj(z)")?;
    conj(&args[0])
}

fn variant_real(args: &[Variant]) -> RuntimeResult<Variant> {
    check_arity(args, 1, "real", "real(z)")?;
    real(&args[0])
}

fn variant_imag(args: &[Variant]) -> RuntimeResult<Variant> {
    check_arity(args, 1, "imag", "imag(z)")?;
    imag(&args[0])
}
