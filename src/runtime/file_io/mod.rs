//! File boundary functions.
//!
//! A [`FileTable`] maps file numbers to open streams. Every read returns a
//! two-element tuple `(value, success)`; reaching end of file yields
//! `(zero, false)` without raising. Failures raise file-class errors, and
//! when that class is disabled the read yields `(zero, false)` and writes
//! report `false`.
//!
//! Text files hold whitespace-separated tokens and TAB-separated matrices
//! (see [`matrix_csv`]). Binary files hold fixed-width little-endian scalars
//! and the layout in [`matrix_binary`].

pub mod matrix_binary;
pub mod matrix_csv;
mod number_parse;

use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use number_parse::{parse_boolean, parse_integer, parse_real};

use crate::runtime::{
    containers::Tuple,
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    scalar::Complex,
    variant::{ValueType, Variant},
};

/// Failure while encoding or decoding a matrix.
#[derive(Debug, Error)]
pub enum MatrixFormatError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Malformed(String),

    #[error("unknown matrix element code {0:#04x}")]
    UnknownElementCode(u8),

    #[error("{0} is not a matrix type")]
    UnsupportedType(ValueType),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMode {
    Read,
    /// Truncates or creates.
    Write,
    Append,
    /// Read and write without truncating; creates the file if missing.
    ReadWrite,
}

impl FileMode {
    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            FileMode::Read => options.read(true),
            FileMode::Write => options.write(true).create(true).truncate(true),
            FileMode::Append => options.append(true).create(true),
            FileMode::ReadWrite => options.read(true).write(true).create(true),
        };
        options
    }

    pub fn can_read(self) -> bool {
        matches!(self, FileMode::Read | FileMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        !matches!(self, FileMode::Read)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Text,
    Binary,
}

impl FileKind {
    /// Infers the kind from the extension: `txt`, `csv`, `tsv` and `dat` are
    /// text; `bin` and `raw` are binary.
    pub fn from_path(path: &Path) -> Option<FileKind> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "txt" | "csv" | "tsv" | "dat" => Some(FileKind::Text),
            "bin" | "raw" => Some(FileKind::Binary),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct OpenFile {
    stream: BufReader<File>,
    path: PathBuf,
    mode: FileMode,
    kind: FileKind,
}

impl OpenFile {
    /// Drops read-ahead so the OS position matches the logical position.
    fn sync_position(&mut self) -> io::Result<()> {
        self.stream.seek(SeekFrom::Current(0)).map(|_| ())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sync_position()?;
        self.stream.get_mut().write_all(bytes)
    }

    /// Fills `buffer`, returning `false` on a clean end of file.
    fn read_exact_or_eof(&mut self, buffer: &mut [u8]) -> io::Result<bool> {
        match self.stream.read_exact(buffer) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Next whitespace-delimited token, or `None` at end of file.
    fn read_token(&mut self) -> io::Result<Option<String>> {
        let mut token = Vec::new();
        loop {
            let available = self.stream.fill_buf()?;
            if available.is_empty() {
                break;
            }
            let mut consumed = 0;
            let mut done = false;
            for &byte in available {
                consumed += 1;
                if byte.is_ascii_whitespace() {
                    if !token.is_empty() {
                        done = true;
                        break;
                    }
                } else {
                    token.push(byte);
                }
            }
            self.stream.consume(consumed);
            if done {
                break;
            }
        }
        if token.is_empty() {
            return Ok(None);
        }
        String::from_utf8(token)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn pair(value: Variant, success: bool) -> Tuple {
    Tuple::from_vec(vec![value, Variant::Boolean(success)])
}

fn validate_width(width: i32) -> RuntimeResult<Option<usize>> {
    if width == 0 || width.unsigned_abs() > 8 {
        return raise(
            RuntimeError::invalid_parameter(format!(
                "integer width must be between -8 and 8 and non-zero, got {}",
                width
            )),
            None,
        );
    }
    Ok(Some(width.unsigned_abs() as usize))
}

/// Sign-extends `bytes` (little-endian unless `big_endian`).
fn decode_integer(bytes: &[u8], big_endian: bool) -> i64 {
    let mut word = [0u8; 8];
    let len = bytes.len();
    if big_endian {
        for (i, byte) in bytes.iter().rev().enumerate() {
            word[i] = *byte;
        }
    } else {
        word[..len].copy_from_slice(bytes);
    }
    let shift = 64 - 8 * len as u32;
    (i64::from_le_bytes(word) << shift) >> shift
}

fn encode_integer(value: i64, len: usize, big_endian: bool) -> Vec<u8> {
    let bytes = value.to_le_bytes();
    let mut out = bytes[..len].to_vec();
    if big_endian {
        out.reverse();
    }
    out
}

fn format_real(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:?}", value)
    }
}

/// Table of open files keyed by file number. File numbers start at 1 and are
/// not reused while the table lives.
#[derive(Debug)]
pub struct FileTable {
    files: BTreeMap<i64, OpenFile>,
    next_number: i64,
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTable {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            next_number: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_open(&self, file_number: i64) -> bool {
        self.files.contains_key(&file_number)
    }

    pub fn kind(&self, file_number: i64) -> Option<FileKind> {
        self.files.get(&file_number).map(|f| f.kind)
    }

    /// Opens `path` with its kind inferred from the extension. Returns the
    /// file number, or 0 when the error is suppressed.
    pub fn open(&mut self, path: impl AsRef<Path>, mode: FileMode) -> RuntimeResult<i64> {
        let path = path.as_ref();
        match FileKind::from_path(path) {
            Some(kind) => self.open_as(path, mode, kind),
            None => raise(RuntimeError::UnknownFileType(path.display().to_string()), 0),
        }
    }

    pub fn open_as(&mut self, path: impl AsRef<Path>, mode: FileMode, kind: FileKind) -> RuntimeResult<i64> {
        let path = path.as_ref();
        let file = match mode.options().open(path) {
            Ok(file) => file,
            Err(error) => {
                return raise(
                    RuntimeError::FileOpenError {
                        path: path.display().to_string(),
                        reason: error.to_string(),
                    },
                    0,
                );
            }
        };
        let file_number = self.next_number;
        self.next_number += 1;
        debug!(file_number, path = %path.display(), ?mode, ?kind, "opened file");
        self.files.insert(
            file_number,
            OpenFile {
                stream: BufReader::new(file),
                path: path.to_path_buf(),
                mode,
                kind,
            },
        );
        Ok(file_number)
    }

    fn file(&mut self, file_number: i64) -> RuntimeResult<Option<&mut OpenFile>> {
        if !self.files.contains_key(&file_number) {
            return raise(RuntimeError::InvalidFileNumber(file_number), None);
        }
        Ok(self.files.get_mut(&file_number))
    }

    pub fn close(&mut self, file_number: i64) -> RuntimeResult<bool> {
        let Some(mut open) = self.files.remove(&file_number) else {
            return raise(RuntimeError::InvalidFileNumber(file_number), false);
        };
        debug!(file_number, path = %open.path.display(), "closing file");
        match open.stream.get_mut().flush() {
            Ok(()) => Ok(true),
            Err(error) => raise(
                RuntimeError::FileCloseError {
                    file_number,
                    reason: error.to_string(),
                },
                false,
            ),
        }
    }

    /// Closes every open file, reporting the first failure.
    pub fn close_all(&mut self) -> RuntimeResult<bool> {
        let numbers: Vec<i64> = self.files.keys().copied().collect();
        let mut outcome = Ok(true);
        for file_number in numbers {
            let closed = self.close(file_number);
            if matches!(outcome, Ok(true)) {
                outcome = closed;
            }
        }
        outcome
    }

    /// Moves to the absolute byte `position`.
    pub fn seek(&mut self, file_number: i64, position: i64) -> RuntimeResult<bool> {
        let Some(open) = self.file(file_number)? else {
            return Ok(false);
        };
        let outcome = u64::try_from(position)
            .map_err(|_| format!("negative position {}", position))
            .and_then(|p| {
                open.stream
                    .seek(SeekFrom::Start(p))
                    .map_err(|e| e.to_string())
            });
        match outcome {
            Ok(_) => Ok(true),
            Err(reason) => raise(
                RuntimeError::FileSeekError {
                    file_number,
                    reason,
                },
                false,
            ),
        }
    }

    /// Current byte position, or -1 when the error is suppressed.
    pub fn position(&mut self, file_number: i64) -> RuntimeResult<i64> {
        let Some(open) = self.file(file_number)? else {
            return Ok(-1);
        };
        match open.stream.stream_position() {
            Ok(position) => Ok(position as i64),
            Err(error) => raise(
                RuntimeError::FileSeekError {
                    file_number,
                    reason: error.to_string(),
                },
                -1,
            ),
        }
    }

    /// File size in bytes, or -1 when the error is suppressed.
    pub fn size(&mut self, file_number: i64) -> RuntimeResult<i64> {
        let Some(open) = self.file(file_number)? else {
            return Ok(-1);
        };
        match open.stream.get_ref().metadata() {
            Ok(metadata) => Ok(metadata.len() as i64),
            Err(error) => raise(
                RuntimeError::FileReadError {
                    file_number,
                    reason: error.to_string(),
                },
                -1,
            ),
        }
    }

    /// Runs a read against an open, readable file. `zero` is returned with
    /// `success == false` on end of file and on suppressed errors.
    fn read_with(
        &mut self,
        file_number: i64,
        zero: Variant,
        read: impl FnOnce(&mut OpenFile) -> Result<Option<Variant>, String>,
    ) -> RuntimeResult<Tuple> {
        let Some(open) = self.file(file_number)? else {
            return Ok(pair(zero, false));
        };
        if !open.mode.can_read() {
            return raise(
                RuntimeError::FileReadError {
                    file_number,
                    reason: "file is not open for reading".to_string(),
                },
                pair(zero, false),
            );
        }
        match read(open) {
            Ok(Some(value)) => Ok(pair(value, true)),
            Ok(None) => Ok(pair(zero, false)),
            Err(reason) => raise(
                RuntimeError::FileReadError {
                    file_number,
                    reason,
                },
                pair(zero, false),
            ),
        }
    }

    fn write_with(
        &mut self,
        file_number: i64,
        write: impl FnOnce(&mut OpenFile) -> Result<(), String>,
    ) -> RuntimeResult<bool> {
        let Some(open) = self.file(file_number)? else {
            return Ok(false);
        };
        if !open.mode.can_write() {
            return raise(
                RuntimeError::FileWriteError {
                    file_number,
                    reason: "file is not open for writing".to_string(),
                },
                false,
            );
        }
        match write(open) {
            Ok(()) => Ok(true),
            Err(reason) => raise(
                RuntimeError::FileWriteError {
                    file_number,
                    reason,
                },
                false,
            ),
        }
    }

    /// Reads one token from a text file and parses it.
    fn read_parsed(
        &mut self,
        file_number: i64,
        zero: Variant,
        parse: impl FnOnce(&str) -> Option<Variant>,
    ) -> RuntimeResult<Tuple> {
        let mut malformed = None;
        let result = self.read_with(file_number, zero.clone(), |open| {
            let Some(token) = open.read_token().map_err(|e| e.to_string())? else {
                return Ok(None);
            };
            match parse(&token) {
                Some(value) => Ok(Some(value)),
                None => {
                    malformed = Some(token);
                    Ok(None)
                }
            }
        })?;
        match malformed {
            Some(token) => raise(
                RuntimeError::MalformedString(format!(
                    "`{}` is not a valid {}",
                    token,
                    zero.value_type()
                )),
                pair(zero, false),
            ),
            None => Ok(result),
        }
    }

    fn read_bytes(
        &mut self,
        file_number: i64,
        zero: Variant,
        len: usize,
        decode: impl FnOnce(&[u8]) -> Variant,
    ) -> RuntimeResult<Tuple> {
        self.read_with(file_number, zero, |open| {
            let mut buffer = vec![0u8; len];
            if open.read_exact_or_eof(&mut buffer).map_err(|e| e.to_string())? {
                Ok(Some(decode(&buffer)))
            } else {
                Ok(None)
            }
        })
    }

    fn is_binary(&self, file_number: i64) -> bool {
        self.kind(file_number) == Some(FileKind::Binary)
    }

    /// Reads an integer. Binary files store `|width|` bytes, big-endian when
    /// `width` is negative, sign-extended on read. Text files read one token
    /// and only validate the width.
    pub fn read_integer(&mut self, file_number: i64, width: i32) -> RuntimeResult<Tuple> {
        let zero = Variant::Integer(0);
        let Some(len) = validate_width(width)? else {
            return Ok(pair(zero, false));
        };
        if self.is_binary(file_number) {
            self.read_bytes(file_number, zero, len, |bytes| {
                Variant::Integer(decode_integer(bytes, width < 0))
            })
        } else {
            self.read_parsed(file_number, zero, |t| parse_integer(t).map(Variant::Integer))
        }
    }

    /// Writes an integer. Binary files keep the low `|width|` bytes.
    pub fn write_integer(&mut self, file_number: i64, value: i64, width: i32) -> RuntimeResult<bool> {
        let Some(len) = validate_width(width)? else {
            return Ok(false);
        };
        let bytes = if self.is_binary(file_number) {
            encode_integer(value, len, width < 0)
        } else {
            format!("{}\n", value).into_bytes()
        };
        self.write_with(file_number, |open| open.write_all(&bytes).map_err(|e| e.to_string()))
    }

    pub fn read_real(&mut self, file_number: i64) -> RuntimeResult<Tuple> {
        let zero = Variant::Real(0.0);
        if self.is_binary(file_number) {
            self.read_bytes(file_number, zero, 8, |bytes| {
                Variant::Real(f64::from_bits(decode_integer(bytes, false) as u64))
            })
        } else {
            self.read_parsed(file_number, zero, |t| parse_real(t).map(Variant::Real))
        }
    }

    pub fn write_real(&mut self, file_number: i64, value: f64) -> RuntimeResult<bool> {
        let bytes = if self.is_binary(file_number) {
            value.to_le_bytes().to_vec()
        } else {
            format!("{}\n", format_real(value)).into_bytes()
        };
        self.write_with(file_number, |open| open.write_all(&bytes).map_err(|e| e.to_string()))
    }

    /// Reads a complex value: two reals, real part first.
    pub fn read_complex(&mut self, file_number: i64) -> RuntimeResult<Tuple> {
        let zero = Variant::Complex(Complex::ZERO);
        if self.is_binary(file_number) {
            return self.read_bytes(file_number, zero, 16, |bytes| {
                let real = f64::from_bits(decode_integer(&bytes[..8], false) as u64);
                let imag = f64::from_bits(decode_integer(&bytes[8..], false) as u64);
                Variant::Complex(Complex::new(real, imag))
            });
        }
        let real = self.read_real(file_number)?;
        let imag = self.read_real(file_number)?;
        let (Ok(Variant::Real(re)), Ok(Variant::Real(im))) = (real.at(1), imag.at(1)) else {
            return Ok(pair(zero, false));
        };
        let success = real.at(2) == Ok(Variant::Boolean(true)) && imag.at(2) == Ok(Variant::Boolean(true));
        if success {
            Ok(pair(Variant::Complex(Complex::new(re, im)), true))
        } else {
            Ok(pair(zero, false))
        }
    }

    pub fn write_complex(&mut self, file_number: i64, value: Complex) -> RuntimeResult<bool> {
        let bytes = if self.is_binary(file_number) {
            let mut bytes = value.real.to_le_bytes().to_vec();
            bytes.extend_from_slice(&value.imag.to_le_bytes());
            bytes
        } else {
            format!("{}\t{}\n", format_real(value.real), format_real(value.imag)).into_bytes()
        };
        self.write_with(file_number, |open| open.write_all(&bytes).map_err(|e| e.to_string()))
    }

    pub fn read_boolean(&mut self, file_number: i64) -> RuntimeResult<Tuple> {
        let zero = Variant::Boolean(false);
        if self.is_binary(file_number) {
            self.read_bytes(file_number, zero, 1, |bytes| Variant::Boolean(bytes[0] != 0))
        } else {
            self.read_parsed(file_number, zero, |t| parse_boolean(t).map(Variant::Boolean))
        }
    }

    pub fn write_boolean(&mut self, file_number: i64, value: bool) -> RuntimeResult<bool> {
        let bytes = if self.is_binary(file_number) {
            vec![value as u8]
        } else {
            format!("{}\n", value).into_bytes()
        };
        self.write_with(file_number, |open| open.write_all(&bytes).map_err(|e| e.to_string()))
    }

    /// Reads up to the next newline, which is consumed but not returned
    /// (nor is a preceding carriage return). The line comes back as a string
    /// tuple.
    pub fn read_line(&mut self, file_number: i64) -> RuntimeResult<Tuple> {
        self.read_with(file_number, Variant::Tuple(Tuple::new()), |open| {
            let mut line = Vec::new();
            let read = open
                .stream
                .read_until(b'\n', &mut line)
                .map_err(|e| e.to_string())?;
            if read == 0 {
                return Ok(None);
            }
            if line.last() == Some(&b'\n') {
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
            }
            Ok(Some(Variant::Tuple(
                line.into_iter().map(|b| Variant::Integer(b as i64)).collect(),
            )))
        })
    }

    /// Writes text with no terminator. String tuples are written as their
    /// text; any other value is written in display form.
    pub fn write_text(&mut self, file_number: i64, value: &Variant) -> RuntimeResult<bool> {
        let text = match value {
            Variant::Tuple(tuple) => tuple.to_string_value()?,
            other => other.to_string(),
        };
        self.write_with(file_number, |open| {
            open.write_all(text.as_bytes()).map_err(|e| e.to_string())
        })
    }

    /// Reads a matrix of type `target`. Text files consume the rest of the
    /// file; binary files read one matrix and convert it to `target`.
    pub fn read_matrix(&mut self, file_number: i64, target: ValueType) -> RuntimeResult<Tuple> {
        if !target.is_matrix() {
            return raise(
                RuntimeError::invalid_parameter(format!("{} is not a matrix type", target)),
                pair(Variant::zero_of(target), false),
            );
        }
        let zero = Variant::zero_of(target);
        let binary = self.is_binary(file_number);
        let mut failure = None;
        let result = self.read_with(file_number, zero.clone(), |open| {
            let at_end = open
                .stream
                .fill_buf()
                .map(|available| available.is_empty())
                .map_err(|e| e.to_string())?;
            if at_end {
                return Ok(None);
            }
            let decoded = if binary {
                matrix_binary::read(&mut open.stream)
            } else {
                matrix_csv::read(&mut open.stream, target)
            };
            match decoded {
                Ok(value) => Ok(Some(value)),
                Err(MatrixFormatError::Io(error)) => Err(error.to_string()),
                Err(error) => {
                    failure = Some(error);
                    Ok(None)
                }
            }
        })?;
        let Some(error) = failure else {
            return match result.at(1) {
                Ok(value) if result.at(2) == Ok(Variant::Boolean(true)) => {
                    match value.convert(target) {
                        Ok(converted) => Ok(pair(converted, true)),
                        Err(error) => raise(error, pair(zero, false)),
                    }
                }
                _ => Ok(result),
            };
        };
        let error = match error {
            MatrixFormatError::Malformed(reason) => RuntimeError::MalformedString(reason),
            MatrixFormatError::UnknownElementCode(code) => {
                RuntimeError::UnknownFileType(format!("matrix element code {:#04x}", code))
            }
            MatrixFormatError::Runtime(error) => error,
            other => RuntimeError::FileReadError {
                file_number,
                reason: other.to_string(),
            },
        };
        raise(error, pair(zero, false))
    }

    /// Writes a matrix: TAB-separated rows for text files, the binary layout
    /// (little-endian) for binary files.
    pub fn write_matrix(&mut self, file_number: i64, value: &Variant) -> RuntimeResult<bool> {
        if !value.value_type().is_matrix() {
            return raise(
                RuntimeError::type_conversion(value.value_type(), ValueType::MatrixReal),
                false,
            );
        }
        let encoded = if self.is_binary(file_number) {
            matrix_binary::encode(value, false)
        } else {
            matrix_csv::render(value).map(String::into_bytes)
        };
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(error) => {
                return raise(
                    RuntimeError::FileWriteError {
                        file_number,
                        reason: error.to_string(),
                    },
                    false,
                );
            }
        };
        self.write_with(file_number, |open| open.write_all(&bytes).map_err(|e| e.to_string()))
    }
}
