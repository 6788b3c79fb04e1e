use crate::runtime::{
    containers::{OrderedSet, Range, Tuple},
    conversion::inline_to_integer,
    error::{RuntimeError, RuntimeResult},
    matrix::MatrixInteger,
    policy::raise,
    variant::{ValueType, Variant},
};

/// Per-axis index selector used by matrix slicing. Indexes are 1-based.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Every index along the axis.
    All,
    Index(i64),
    Range(Range),
    Set(OrderedSet),
    Tuple(Tuple),
    /// Every element, in column-major order.
    Matrix(MatrixInteger),
}

impl Selector {
    /// A scalar selector picks a single index and does not add an axis to
    /// the result.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Selector::Index(_))
    }

    /// Interprets a variant as a selector. Scalars must reduce to Integer;
    /// matrices are converted to integer indexes.
    pub fn from_variant(value: &Variant) -> RuntimeResult<Selector> {
        Ok(match value {
            Variant::Set(set) => Selector::Set(set.clone()),
            Variant::Tuple(tuple) => Selector::Tuple(tuple.clone()),
            Variant::MatrixInteger(m) => Selector::Matrix(m.clone()),
            Variant::MatrixBoolean(m) => Selector::Matrix(m.map(|v| v as i64)),
            Variant::MatrixReal(_) | Variant::MatrixComplex(_) => {
                match value.convert(ValueType::MatrixInteger)? {
                    Variant::MatrixInteger(m) => Selector::Matrix(m),
                    _ => Selector::Matrix(MatrixInteger::default()),
                }
            }
            other => Selector::Index(inline_to_integer(other)?),
        })
    }

    /// Resolves to 0-based offsets within `extent`. Out-of-range indexes
    /// raise `InvalidParameterValue`; with the class disabled they are
    /// skipped.
    pub(crate) fn resolve(&self, extent: usize) -> RuntimeResult<Vec<usize>> {
        let mut offsets = Vec::new();
        let mut push = |index: i64| -> RuntimeResult<()> {
            match usize::try_from(index) {
                Ok(position) if position >= 1 && position <= extent => {
                    offsets.push(position - 1);
                    Ok(())
                }
                _ => raise(
                    RuntimeError::invalid_parameter(format!(
                        "index {} out of range 1..={}",
                        index, extent
                    )),
                    (),
                ),
            }
        };
        match self {
            Selector::All => {
                return Ok((0..extent).collect());
            }
            Selector::Index(index) => push(*index)?,
            Selector::Range(range) => {
                for index in range.iter() {
                    push(index)?;
                }
            }
            Selector::Set(set) => {
                for value in set.iter() {
                    push(inline_to_integer(value)?)?;
                }
            }
            Selector::Tuple(tuple) => {
                for value in tuple.iter() {
                    push(inline_to_integer(value)?)?;
                }
            }
            Selector::Matrix(matrix) => {
                for index in matrix.iter() {
                    push(*index)?;
                }
            }
        }
        Ok(offsets)
    }
}

impl From<i64> for Selector {
    fn from(index: i64) -> Self {
        Selector::Index(index)
    }
}

impl From<Range> for Selector {
    fn from(range: Range) -> Self {
        Selector::Range(range)
    }
}
