//! Tab-separated matrix text.
//!
//! One matrix row per line, fields separated by TAB. Booleans are written as
//! `1`/`0`, reals in shortest round-trip form, and complex values as two
//! adjacent fields holding the real and imaginary parts.

use std::io::{Read, Write};

use csv::{ReaderBuilder, Terminator, WriterBuilder};

use super::{
    MatrixFormatError,
    number_parse::{parse_boolean, parse_integer, parse_real},
};
use crate::runtime::{
    matrix::{Element, Matrix},
    scalar::Complex,
    variant::{ValueType, Variant},
};

fn format_real(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:?}", value)
    }
}

fn write_rows<T: Element, W: Write>(
    writer: &mut csv::Writer<W>,
    matrix: &Matrix<T>,
    fields: impl Fn(T) -> Vec<String>,
) -> Result<(), MatrixFormatError> {
    for row in 0..matrix.rows() {
        let mut record = Vec::with_capacity(matrix.columns());
        for column in 0..matrix.columns() {
            record.extend(fields(matrix.get(row, column)));
        }
        writer.write_record(&record)?;
    }
    Ok(())
}

/// Writes a matrix variant. Non-matrix values are rejected.
pub fn write<W: Write>(writer: W, value: &Variant) -> Result<(), MatrixFormatError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    match value {
        Variant::MatrixBoolean(m) => {
            write_rows(&mut writer, m, |v| vec![if v { "1" } else { "0" }.to_string()])?
        }
        Variant::MatrixInteger(m) => write_rows(&mut writer, m, |v| vec![v.to_string()])?,
        Variant::MatrixReal(m) => write_rows(&mut writer, m, |v| vec![format_real(v)])?,
        Variant::MatrixComplex(m) => write_rows(&mut writer, m, |v| {
            vec![format_real(v.real), format_real(v.imag)]
        })?,
        other => {
            return Err(MatrixFormatError::Malformed(format!(
                "{} is not a matrix",
                other.value_type()
            )));
        }
    }
    writer.flush()?;
    Ok(())
}

/// Renders a matrix variant as text.
pub fn render(value: &Variant) -> Result<String, MatrixFormatError> {
    let mut buffer = Vec::new();
    write(&mut buffer, value)?;
    String::from_utf8(buffer).map_err(|e| MatrixFormatError::Malformed(e.to_string()))
}

fn parse_field<T>(field: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, MatrixFormatError> {
    parse(field).ok_or_else(|| MatrixFormatError::Malformed(format!("invalid field `{}`", field)))
}

/// Parses row records into a matrix; `width` fields form one element.
fn collect<T: Element>(
    records: &[Vec<String>],
    width: usize,
    element: impl Fn(&[String]) -> Result<T, MatrixFormatError>,
) -> Result<Matrix<T>, MatrixFormatError> {
    let fields = records.first().map_or(0, Vec::len);
    if fields % width != 0 {
        return Err(MatrixFormatError::Malformed(format!(
            "{} fields do not form whole elements",
            fields
        )));
    }
    if let Some(index) = records.iter().position(|r| r.len() != fields) {
        return Err(MatrixFormatError::Malformed(format!(
            "row {} has {} fields, expected {}",
            index + 1,
            records[index].len(),
            fields
        )));
    }
    let rows = records.len();
    let columns = fields / width;
    let mut values = Vec::with_capacity(rows * columns);
    for column in 0..columns {
        for record in records {
            values.push(element(&record[column * width..(column + 1) * width])?);
        }
    }
    Ok(Matrix::build(rows, columns, values)?)
}

/// Reads a matrix of type `target` from the remaining text.
pub fn read<R: Read>(reader: R, target: ValueType) -> Result<Variant, MatrixFormatError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Ok(match target {
        ValueType::MatrixBoolean => {
            Variant::MatrixBoolean(collect(&records, 1, |f| parse_field(&f[0], parse_boolean))?)
        }
        ValueType::MatrixInteger => {
            Variant::MatrixInteger(collect(&records, 1, |f| parse_field(&f[0], parse_integer))?)
        }
        ValueType::MatrixReal => {
            Variant::MatrixReal(collect(&records, 1, |f| parse_field(&f[0], parse_real))?)
        }
        ValueType::MatrixComplex => Variant::MatrixComplex(collect(&records, 2, |f| {
            Ok(Complex::new(
                parse_field(&f[0], parse_real)?,
                parse_field(&f[1], parse_real)?,
            ))
        })?),
        other => return Err(MatrixFormatError::UnsupportedType(other)),
    })
}
