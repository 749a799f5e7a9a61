use serde::de::DeserializeOwned;

use crate::arr::{Key, Mapping, PathResolver, PathSpec, Value};

use super::ConfigError;

/// The resolved data of one configuration group.
///
/// Groups are produced and cached by
/// [`ConfigRegistry::load`](super::ConfigRegistry::load). Changes go through
/// [`ConfigRegistry::set`](super::ConfigRegistry::set), which updates the
/// cached group and every writable source.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigGroup {
    name: String,
    data: Mapping,
    resolver: PathResolver,
}

impl ConfigGroup {
    pub(crate) fn new(name: impl Into<String>, data: Mapping, resolver: PathResolver) -> Self {
        Self {
            name: name.into(),
            data,
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.data.get(&key.into())
    }

    pub fn get_or(&self, key: impl Into<Key>, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Reads a nested value, using the registry's delimiter.
    pub fn path(&self, path: impl Into<PathSpec>) -> Option<Value> {
        self.resolver.path_in(&self.data, path)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.data
    }

    pub fn into_mapping(self) -> Mapping {
        self.data
    }

    /// Deserializes the group into a typed configuration struct.
    ///
    /// Null entries are treated as missing.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let value = toml::Value::Table(self.data.to_toml_table()?);
        value.try_into().map_err(ConfigError::DeserializeError)
    }

    pub(crate) fn set(&mut self, key: Key, value: Value) {
        self.data.insert(key, value);
    }
}
