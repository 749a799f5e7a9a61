use std::collections::HashMap;

use parking_lot::RwLock;

use crate::arr::{Key, Mapping, Value};

use super::SourceError;

/// Something a [`ConfigRegistry`](super::ConfigRegistry) can pull group data
/// from or push changes to.
///
/// A source opts into each capability by returning itself from
/// [`as_reader`](Self::as_reader) and/or [`as_writer`](Self::as_writer).
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Name used in diagnostics and error reports.
    fn name(&self) -> &str;

    fn as_reader(&self) -> Option<&dyn ConfigReader> {
        None
    }

    fn as_writer(&self) -> Option<&dyn ConfigWriter> {
        None
    }
}

pub trait ConfigReader {
    /// Loads the raw data of `group`.
    ///
    /// `Ok(None)` means the source has nothing for this group. Loading must
    /// not have side effects.
    fn load(&self, group: &str) -> Result<Option<Mapping>, SourceError>;
}

pub trait ConfigWriter {
    /// Persists one top-level key of `group`.
    fn write(&self, group: &str, key: &Key, value: &Value) -> Result<(), SourceError>;
}

/// An in-memory source, readable and (unless made read-only) writable.
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    writable: bool,
    groups: RwLock<HashMap<String, Mapping>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writable: true,
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Seeds the data of one group.
    pub fn with_group(self, group: impl Into<String>, data: Mapping) -> Self {
        self.groups.write().insert(group.into(), data);
        self
    }

    /// Drops the writer capability.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Returns a snapshot of one group's data.
    pub fn group(&self, group: &str) -> Option<Mapping> {
        self.groups.read().get(group).cloned()
    }
}

impl ConfigSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_reader(&self) -> Option<&dyn ConfigReader> {
        Some(self)
    }

    fn as_writer(&self) -> Option<&dyn ConfigWriter> {
        self.writable.then_some(self as &dyn ConfigWriter)
    }
}

impl ConfigReader for MemorySource {
    fn load(&self, group: &str) -> Result<Option<Mapping>, SourceError> {
        Ok(self.group(group))
    }
}

impl ConfigWriter for MemorySource {
    fn write(&self, group: &str, key: &Key, value: &Value) -> Result<(), SourceError> {
        self.groups
            .write()
            .entry(group.to_string())
            .or_default()
            .insert(key.clone(), value.clone());
        Ok(())
    }
}
