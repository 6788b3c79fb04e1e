//! Typed runtime errors.
//!
//! Every failable runtime operation reports one of these. Most variants belong
//! to an [`ErrorClass`] whose process-wide enable flag (see
//! [`crate::runtime::policy`]) decides whether the error is raised or replaced
//! by a sentinel result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::variant::ValueType;

/// Gating class for a [`RuntimeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    File,
    MalformedString,
    TypeConversion,
    InvalidParameterValue,
    NaN,
    Infinity,
    Convergence,
}

impl ErrorClass {
    pub const ALL: [ErrorClass; 7] = [
        ErrorClass::File,
        ErrorClass::MalformedString,
        ErrorClass::TypeConversion,
        ErrorClass::InvalidParameterValue,
        ErrorClass::NaN,
        ErrorClass::Infinity,
        ErrorClass::Convergence,
    ];

    pub(crate) fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("could not open file `{path}`: {reason}")]
    FileOpenError { path: String, reason: String },

    #[error("file {file_number}: read failed: {reason}")]
    FileReadError { file_number: i64, reason: String },

    #[error("file {file_number}: write failed: {reason}")]
    FileWriteError { file_number: i64, reason: String },

    #[error("file {file_number}: seek failed: {reason}")]
    FileSeekError { file_number: i64, reason: String },

    #[error("file {file_number}: close failed: {reason}")]
    FileCloseError { file_number: i64, reason: String },

    #[error("invalid file number {0}")]
    InvalidFileNumber(i64),

    #[error("unknown file type: {0}")]
    UnknownFileType(String),

    #[error("malformed string: {0}")]
    MalformedString(String),

    #[error("can not convert {0} to a string")]
    CanNotConvertToString(ValueType),

    #[error("can not convert {from} to {to}")]
    TypeConversion { from: ValueType, to: ValueType },

    #[error("invalid parameter value: {0}")]
    InvalidParameterValue(String),

    #[error("result is NaN")]
    ResultIsNaN,

    #[error("result is infinite")]
    ResultIsInfinite,

    #[error("operation can not converge after {iterations} iterations")]
    CanNotConverge { iterations: u64 },

    #[error(
        "incompatible matrix dimensions: {multiplier_rows}x{multiplier_columns} and \
         {multiplicand_rows}x{multiplicand_columns}"
    )]
    IncompatibleMatrixDimensions {
        multiplier_rows: usize,
        multiplier_columns: usize,
        multiplicand_rows: usize,
        multiplicand_columns: usize,
    },

    /// Cooperative abort raised at a checkpoint. Never gated.
    #[error("aborted")]
    Aborted,
}

impl RuntimeError {
    /// Returns the gating class, or `None` for errors that are always raised.
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            RuntimeError::FileOpenError { .. }
            | RuntimeError::FileReadError { .. }
            | RuntimeError::FileWriteError { .. }
            | RuntimeError::FileSeekError { .. }
            | RuntimeError::FileCloseError { .. }
            | RuntimeError::InvalidFileNumber(_)
            | RuntimeError::UnknownFileType(_) => Some(ErrorClass::File),
            RuntimeError::MalformedString(_) | RuntimeError::CanNotConvertToString(_) => {
                Some(ErrorClass::MalformedString)
            }
            RuntimeError::TypeConversion { .. } => Some(ErrorClass::TypeConversion),
            RuntimeError::InvalidParameterValue(_) => Some(ErrorClass::InvalidParameterValue),
            RuntimeError::ResultIsNaN => Some(ErrorClass::NaN),
            RuntimeError::ResultIsInfinite => Some(ErrorClass::Infinity),
            RuntimeError::CanNotConverge { .. } => Some(ErrorClass::Convergence),
            RuntimeError::IncompatibleMatrixDimensions { .. } | RuntimeError::Aborted => None,
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, RuntimeError::Aborted)
    }

    pub fn type_conversion(from: ValueType, to: ValueType) -> Self {
        RuntimeError::TypeConversion { from, to }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        RuntimeError::InvalidParameterValue(message.into())
    }

    pub fn incompatible_dimensions(
        multiplier: (usize, usize),
        multiplicand: (usize, usize),
    ) -> Self {
        RuntimeError::IncompatibleMatrixDimensions {
            multiplier_rows: multiplier.0,
            multiplier_columns: multiplier.1,
            multiplicand_rows: multiplicand.0,
            multiplicand_columns: multiplicand.1,
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
