//! Identifier database: the host's view of user-program variables.
//!
//! Entries are keyed by host-assigned handle with a secondary index on the
//! `(text1, text2)` name pair. Lookups that miss return an invalid sentinel
//! entry instead of failing.

use std::{collections::BTreeMap, ops::Bound, sync::Arc};

use parking_lot::RwLock;

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    variant::{ValueType, Variant},
};

/// Shared storage cell of one identifier. Compiled code and the host hold
/// clones of the same cell.
pub type Storage = Arc<RwLock<Variant>>;

pub type Handle = u64;

#[derive(Debug, Clone)]
pub struct IdentifierEntry {
    handle: Handle,
    text1: String,
    text2: String,
    is_function: bool,
    value_type: ValueType,
    storage: Option<Storage>,
}

impl IdentifierEntry {
    /// A variable entry with fresh storage holding the zero value of
    /// `value_type`.
    pub fn new(
        handle: Handle,
        text1: impl Into<String>,
        text2: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        Self::with_storage(
            handle,
            text1,
            text2,
            value_type,
            Arc::new(RwLock::new(Variant::zero_of(value_type))),
        )
    }

    pub fn with_storage(
        handle: Handle,
        text1: impl Into<String>,
        text2: impl Into<String>,
        value_type: ValueType,
        storage: Storage,
    ) -> Self {
        Self {
            handle,
            text1: text1.into(),
            text2: text2.into(),
            is_function: false,
            value_type,
            storage: Some(storage),
        }
    }

    /// A function entry. Functions have no storage.
    pub fn function(handle: Handle, text1: impl Into<String>, text2: impl Into<String>) -> Self {
        Self {
            handle,
            text1: text1.into(),
            text2: text2.into(),
            is_function: true,
            value_type: ValueType::None,
            storage: None,
        }
    }

    /// The sentinel returned by missed lookups.
    pub fn invalid() -> Self {
        Self {
            handle: 0,
            text1: String::new(),
            text2: String::new(),
            is_function: false,
            value_type: ValueType::None,
            storage: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle != 0
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn text1(&self) -> &str {
        &self.text1
    }

    pub fn text2(&self) -> &str {
        &self.text2
    }

    pub fn is_function(&self) -> bool {
        self.is_function
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    /// Current value; `None` for functions and the sentinel.
    pub fn value(&self) -> Variant {
        self.storage
            .as_ref()
            .map_or(Variant::None, |storage| storage.read().clone())
    }

    /// Writes `value` converted to the declared type. Unrepresentable
    /// values raise `TypeConversion`; with that class disabled the zero
    /// value of the declared type is stored. A declared type of `None`
    /// stores values unchanged.
    pub fn set_value(&self, value: Variant) -> RuntimeResult<()> {
        let Some(storage) = &self.storage else {
            return Err(RuntimeError::invalid_parameter(format!(
                "identifier {} has no storage",
                self.handle
            )));
        };
        let converted = if self.value_type == ValueType::None {
            value
        } else {
            value.convert(self.value_type)?
        };
        *storage.write() = converted;
        Ok(())
    }
}

/// Handle-ordered identifier table.
#[derive(Debug)]
pub struct IdentifierDatabase {
    entries: BTreeMap<Handle, IdentifierEntry>,
    names: BTreeMap<(String, String), Handle>,
    invalid: IdentifierEntry,
}

impl Default for IdentifierDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierDatabase {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            names: BTreeMap::new(),
            invalid: IdentifierEntry::invalid(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry, replacing and returning any entry with the same
    /// handle. Handle 0 is reserved for the sentinel, and a `(text1, text2)`
    /// name may belong to one handle only.
    pub fn insert(&mut self, entry: IdentifierEntry) -> RuntimeResult<Option<IdentifierEntry>> {
        if !entry.is_valid() {
            return Err(RuntimeError::invalid_parameter(
                "identifier handles must be positive",
            ));
        }
        let name = (entry.text1.clone(), entry.text2.clone());
        if let Some(&owner) = self.names.get(&name) {
            if owner != entry.handle {
                return Err(RuntimeError::invalid_parameter(format!(
                    "identifier ({}, {}) is already registered as handle {}",
                    entry.text1, entry.text2, owner
                )));
            }
        }
        let previous = self.entries.remove(&entry.handle);
        if let Some(previous) = &previous {
            self.names
                .remove(&(previous.text1.clone(), previous.text2.clone()));
        }
        self.names.insert(name, entry.handle);
        self.entries.insert(entry.handle, entry);
        Ok(previous)
    }

    pub fn remove(&mut self, handle: Handle) -> Option<IdentifierEntry> {
        let entry = self.entries.remove(&handle)?;
        self.names.remove(&(entry.text1.clone(), entry.text2.clone()));
        Some(entry)
    }

    pub fn entry(&self, handle: Handle) -> &IdentifierEntry {
        self.entries.get(&handle).unwrap_or(&self.invalid)
    }

    pub fn entry_by_name(&self, text1: &str, text2: &str) -> &IdentifierEntry {
        self.names
            .get(&(text1.to_string(), text2.to_string()))
            .map_or(&self.invalid, |handle| self.entry(*handle))
    }

    /// Entries in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = &IdentifierEntry> {
        self.entries.values()
    }

    pub fn cursor(&self) -> IdentifierCursor {
        IdentifierCursor { last: None }
    }
}

/// A position in handle order. Stays valid while entries are inserted;
/// removing the last observed entry resumes at the next larger handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierCursor {
    last: Option<Handle>,
}

impl IdentifierCursor {
    /// Advances to the next entry, or `None` past the end.
    pub fn advance<'a>(&mut self, database: &'a IdentifierDatabase) -> Option<&'a IdentifierEntry> {
        let lower = match self.last {
            Some(handle) => Bound::Excluded(handle),
            None => Bound::Unbounded,
        };
        let (&handle, entry) = database.entries.range((lower, Bound::Unbounded)).next()?;
        self.last = Some(handle);
        Some(entry)
    }

    pub fn rewind(&mut self) {
        self.last = None;
    }
}
