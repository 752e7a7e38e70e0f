use std::io;

use thiserror::Error;

use crate::models::{TwinEntry, TwinValue, ValueError, ValueType};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("twin entry '{0}' is already defined")]
    DuplicateEntry(String),

    #[error("twin entry '{name}' has type {value_type}, only bool entries can drive a GPIO")]
    GpioOnNonBool { name: String, value_type: ValueType },

    #[error("unknown twin entry '{0}'")]
    UnknownEntry(String),

    #[error("twin entry '{name}' has type {expected}, got a {found} value")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("invalid value for twin entry '{name}': {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: ValueError,
    },

    #[error("failed to open GPIO {line}: {source}")]
    OpenGpio {
        line: u32,
        #[source]
        source: io::Error,
    },
}

/// The registry of known twin properties.
///
/// Entries keep their declaration order, which is also the order in which
/// desired changes are applied and reported.
#[derive(Debug, Default)]
pub struct TwinTable {
    entries: Vec<TwinEntry>,
}

impl TwinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the end of the table
    pub fn insert(&mut self, entry: TwinEntry) -> Result<(), TableError> {
        if self.contains(entry.name()) {
            return Err(TableError::DuplicateEntry(entry.name().to_owned()));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn entry(&self, name: &str) -> Option<&TwinEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut TwinEntry> {
        self.entries.iter_mut().find(|e| e.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&TwinValue> {
        self.entry(name).map(|e| e.value())
    }

    pub fn bool_value(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(TwinValue::as_bool)
    }

    pub fn int_value(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(TwinValue::as_int)
    }

    pub fn float_value(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(TwinValue::as_float)
    }

    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TwinValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TwinEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TwinEntry> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
