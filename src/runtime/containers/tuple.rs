use std::{cmp::Ordering, convert::Infallible, str::FromStr, sync::Arc};

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    variant::{Variant, implicit_ordering},
};

/// Finite ordered sequence of variants with 1-based public indexing.
///
/// A tuple whose elements are all Integers in `0..=255` doubles as a UTF-8
/// string; see [`Tuple::to_string_value`].
#[derive(Debug, Clone, Default)]
pub struct Tuple {
    elements: Arc<Vec<Variant>>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(elements: Vec<Variant>) -> Self {
        Self {
            elements: Arc::new(elements),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.elements.iter()
    }

    /// Element at a 1-based index. Out-of-range indexes raise
    /// `InvalidParameterValue` and fall back to `None`.
    pub fn at(&self, index: i64) -> RuntimeResult<Variant> {
        match self.offset(index) {
            Some(offset) if offset < self.len() => Ok(self.elements[offset].clone()),
            _ => raise(
                RuntimeError::invalid_parameter(format!(
                    "tuple index {} out of range 1..={}",
                    index,
                    self.len()
                )),
                Variant::None,
            ),
        }
    }

    /// Writes at a 1-based index, growing the tuple with `None` entries when
    /// the index is past the end.
    pub fn update(&mut self, index: i64, value: Variant) -> RuntimeResult<()> {
        let Some(offset) = self.offset(index) else {
            return raise(
                RuntimeError::invalid_parameter(format!("tuple index {} must be positive", index)),
                (),
            );
        };
        let elements = Arc::make_mut(&mut self.elements);
        if offset >= elements.len() {
            elements.resize(offset + 1, Variant::None);
        }
        elements[offset] = value;
        Ok(())
    }

    pub fn append(&mut self, value: Variant) {
        Arc::make_mut(&mut self.elements).push(value);
    }

    pub fn concatenate(&self, other: &Tuple) -> Tuple {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut elements = Vec::with_capacity(self.len() + other.len());
        elements.extend(self.iter().cloned());
        elements.extend(other.iter().cloned());
        Tuple::from_vec(elements)
    }

    /// Lexicographic order under the cross-type total order, shorter first on
    /// a common prefix.
    pub fn relative_order(&self, other: &Tuple) -> Ordering {
        if Arc::ptr_eq(&self.elements, &other.elements) {
            return Ordering::Equal;
        }
        for (left, right) in self.iter().zip(other.iter()) {
            let ordering = implicit_ordering(left, right);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.len().cmp(&other.len())
    }

    /// Interprets the elements as UTF-8 bytes.
    pub fn to_string_value(&self) -> RuntimeResult<String> {
        let mut bytes = Vec::with_capacity(self.len());
        for element in self.iter() {
            match element {
                Variant::Integer(value) => match u8::try_from(*value) {
                    Ok(byte) => bytes.push(byte),
                    Err(_) => {
                        return raise(
                            RuntimeError::MalformedString(format!(
                                "element {} is not a byte",
                                value
                            )),
                            String::new(),
                        );
                    }
                },
                other => {
                    return raise(
                        RuntimeError::CanNotConvertToString(other.value_type()),
                        String::new(),
                    );
                }
            }
        }
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(err) => raise(
                RuntimeError::MalformedString(format!(
                    "invalid UTF-8 at byte {}",
                    err.utf8_error().valid_up_to()
                )),
                String::from_utf8_lossy(err.as_bytes()).into_owned(),
            ),
        }
    }

    fn offset(&self, index: i64) -> Option<usize> {
        if index < 1 {
            return None;
        }
        usize::try_from(index - 1).ok()
    }
}

impl FromStr for Tuple {
    type Err = Infallible;

    /// Encodes the text as one Integer element per UTF-8 byte.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(Tuple::from(text))
    }
}

impl From<&str> for Tuple {
    fn from(text: &str) -> Self {
        text.bytes().map(|b| Variant::Integer(b as i64)).collect()
    }
}

impl FromIterator<Variant> for Tuple {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Tuple::from_vec(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
