//! Binary matrix layout.
//!
//! ```text
//! code: u8 | rows: i64 | columns: i64 | payload
//! ```
//!
//! `code` is the element's [`Element::CODE`]; an uppercase code means a
//! little-endian header and payload, lowercase means big-endian. The payload is
//! column-major. Boolean columns are packed eight rows per byte, least
//! significant bit first, each column starting on a fresh byte.

use std::io::{Read, Write};

use super::MatrixFormatError;
use crate::runtime::{
    matrix::{Element, Matrix},
    scalar::Complex,
    variant::Variant,
};

const HEADER_LEN: usize = 17;

trait FixedWidth: Element {
    const WIDTH: usize;

    fn put(self, big_endian: bool, out: &mut Vec<u8>);

    fn take(bytes: &[u8], big_endian: bool) -> Self;
}

fn put_u64(bits: u64, big_endian: bool, out: &mut Vec<u8>) {
    if big_endian {
        out.extend_from_slice(&bits.to_be_bytes());
    } else {
        out.extend_from_slice(&bits.to_le_bytes());
    }
}

fn take_u64(bytes: &[u8], big_endian: bool) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    if big_endian {
        u64::from_be_bytes(word)
    } else {
        u64::from_le_bytes(word)
    }
}

impl FixedWidth for i64 {
    const WIDTH: usize = 8;

    fn put(self, big_endian: bool, out: &mut Vec<u8>) {
        put_u64(self as u64, big_endian, out);
    }

    fn take(bytes: &[u8], big_endian: bool) -> Self {
        take_u64(bytes, big_endian) as i64
    }
}

impl FixedWidth for f64 {
    const WIDTH: usize = 8;

    fn put(self, big_endian: bool, out: &mut Vec<u8>) {
        put_u64(self.to_bits(), big_endian, out);
    }

    fn take(bytes: &[u8], big_endian: bool) -> Self {
        f64::from_bits(take_u64(bytes, big_endian))
    }
}

impl FixedWidth for Complex {
    const WIDTH: usize = 16;

    fn put(self, big_endian: bool, out: &mut Vec<u8>) {
        self.real.put(big_endian, out);
        self.imag.put(big_endian, out);
    }

    fn take(bytes: &[u8], big_endian: bool) -> Self {
        Complex::new(
            f64::take(bytes, big_endian),
            f64::take(&bytes[8..], big_endian),
        )
    }
}

fn code_for(code: u8, big_endian: bool) -> u8 {
    if big_endian {
        code.to_ascii_lowercase()
    } else {
        code
    }
}

fn header<T: Element>(matrix: &Matrix<T>, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN);
    out.push(code_for(T::CODE, big_endian));
    (matrix.rows() as i64).put(big_endian, &mut out);
    (matrix.columns() as i64).put(big_endian, &mut out);
    out
}

fn encode_fixed<T: FixedWidth>(matrix: &Matrix<T>, big_endian: bool) -> Vec<u8> {
    let mut out = header(matrix, big_endian);
    out.reserve(matrix.len() * T::WIDTH);
    for value in matrix.iter() {
        value.put(big_endian, &mut out);
    }
    out
}

fn column_bytes(rows: usize) -> usize {
    rows.div_ceil(8)
}

fn encode_boolean(matrix: &Matrix<bool>, big_endian: bool) -> Vec<u8> {
    let mut out = header(matrix, big_endian);
    let per_column = column_bytes(matrix.rows());
    for column in matrix.as_slice().chunks(matrix.rows().max(1)) {
        let start = out.len();
        out.resize(start + per_column, 0);
        for (row, &bit) in column.iter().enumerate() {
            if bit {
                out[start + row / 8] |= 1 << (row % 8);
            }
        }
    }
    out
}

/// Encodes a matrix variant. Non-matrix values are rejected.
pub fn encode(value: &Variant, big_endian: bool) -> Result<Vec<u8>, MatrixFormatError> {
    Ok(match value {
        Variant::MatrixBoolean(m) => encode_boolean(m, big_endian),
        Variant::MatrixInteger(m) => encode_fixed(m, big_endian),
        Variant::MatrixReal(m) => encode_fixed(m, big_endian),
        Variant::MatrixComplex(m) => encode_fixed(m, big_endian),
        other => return Err(MatrixFormatError::UnsupportedType(other.value_type())),
    })
}

pub fn write<W: Write>(mut writer: W, value: &Variant, big_endian: bool) -> Result<(), MatrixFormatError> {
    writer.write_all(&encode(value, big_endian)?)?;
    Ok(())
}

fn dimension(value: i64) -> Result<usize, MatrixFormatError> {
    usize::try_from(value)
        .map_err(|_| MatrixFormatError::Malformed(format!("negative dimension {}", value)))
}

fn read_payload<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>, MatrixFormatError> {
    let mut payload = Vec::new();
    reader.take(len as u64).read_to_end(&mut payload)?;
    if payload.len() != len {
        return Err(MatrixFormatError::Malformed(format!(
            "payload truncated: expected {} bytes, found {}",
            len,
            payload.len()
        )));
    }
    Ok(payload)
}

fn decode_fixed<T: FixedWidth, R: Read>(
    reader: &mut R,
    rows: usize,
    columns: usize,
    big_endian: bool,
) -> Result<Matrix<T>, MatrixFormatError> {
    let len = rows
        .checked_mul(columns)
        .and_then(|n| n.checked_mul(T::WIDTH))
        .ok_or_else(|| MatrixFormatError::Malformed(format!("{}x{} is too large", rows, columns)))?;
    let payload = read_payload(reader, len)?;
    let values = payload
        .chunks_exact(T::WIDTH)
        .map(|bytes| T::take(bytes, big_endian))
        .collect();
    Ok(Matrix::build(rows, columns, values)?)
}

fn decode_boolean<R: Read>(
    reader: &mut R,
    rows: usize,
    columns: usize,
) -> Result<Matrix<bool>, MatrixFormatError> {
    let per_column = column_bytes(rows);
    let len = per_column
        .checked_mul(columns)
        .ok_or_else(|| MatrixFormatError::Malformed(format!("{}x{} is too large", rows, columns)))?;
    let payload = read_payload(reader, len)?;
    let mut values = Vec::with_capacity(rows * columns);
    for column in 0..columns {
        let bytes = &payload[column * per_column..(column + 1) * per_column];
        values.extend((0..rows).map(|row| bytes[row / 8] & (1 << (row % 8)) != 0));
    }
    Ok(Matrix::build(rows, columns, values)?)
}

/// Reads one matrix. The element type and byte order come from the header.
pub fn read<R: Read>(mut reader: R) -> Result<Variant, MatrixFormatError> {
    let mut head = [0u8; HEADER_LEN];
    reader.read_exact(&mut head)?;
    let code = head[0];
    let big_endian = code.is_ascii_lowercase();
    let rows = dimension(i64::take(&head[1..9], big_endian))?;
    let columns = dimension(i64::take(&head[9..17], big_endian))?;

    Ok(match code.to_ascii_uppercase() {
        c if c == bool::CODE => Variant::MatrixBoolean(decode_boolean(&mut reader, rows, columns)?),
        c if c == i64::CODE => {
            Variant::MatrixInteger(decode_fixed(&mut reader, rows, columns, big_endian)?)
        }
        c if c == f64::CODE => {
            Variant::MatrixReal(decode_fixed(&mut reader, rows, columns, big_endian)?)
        }
        c if c == Complex::CODE => {
            Variant::MatrixComplex(decode_fixed(&mut reader, rows, columns, big_endian)?)
        }
        _ => return Err(MatrixFormatError::UnknownElementCode(code)),
    })
}
