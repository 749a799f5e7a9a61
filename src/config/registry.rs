use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::arr::{merge_into, Key, Mapping, PathResolver, Value};

use super::group::ConfigGroup;
use super::source::ConfigSource;
use super::{ConfigError, WriteFailure};

/// Result of [`ConfigRegistry::load`]: a whole group, or the value at a
/// sub-path of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    Group(&'a ConfigGroup),
    Value(Value),
}

impl<'a> Resolved<'a> {
    pub fn group(self) -> Option<&'a ConfigGroup> {
        match self {
            Resolved::Group(group) => Some(group),
            Resolved::Value(_) => None,
        }
    }

    pub fn value(self) -> Option<Value> {
        match self {
            Resolved::Group(_) => None,
            Resolved::Value(value) => Some(value),
        }
    }
}

/// Cascading configuration over an ordered list of sources.
///
/// Sources earlier in the list take precedence. Loading a group merges the
/// data of every readable source, lowest precedence first, so
/// higher-precedence sources win conflicts under [`merge`](crate::arr::merge)
/// rules. Resolved groups are cached until the source list changes.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use dragon_cascade::arr::{Mapping, Value};
/// use dragon_cascade::config::{ConfigRegistry, MemorySource};
///
/// let defaults: Mapping = [("debug", Value::from(true)), ("extra", Value::from("B"))]
///     .into_iter()
///     .collect();
/// let local: Mapping = [("debug", Value::from(false)), ("name", Value::from("A"))]
///     .into_iter()
///     .collect();
///
/// let mut registry = ConfigRegistry::new();
/// registry
///     .attach(Arc::new(MemorySource::new("local").with_group("app", local)), true)
///     .attach(Arc::new(MemorySource::new("defaults").with_group("app", defaults)), false);
///
/// let app = registry.group("app")?;
/// assert_eq!(app.get("debug"), Some(&Value::from(false)));
/// assert_eq!(app.get("extra"), Some(&Value::from("B")));
///
/// let name = registry.load("app.name")?.value();
/// assert_eq!(name, Some(Value::from("A")));
/// # Ok::<(), dragon_cascade::ConfigError>(())
/// ```
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    sources: Vec<Arc<dyn ConfigSource>>,
    groups: HashMap<String, ConfigGroup>,
    resolver: PathResolver,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry splitting group names and sub-paths with a custom
    /// delimiter.
    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self {
            resolver,
            ..Self::default()
        }
    }

    /// Attaches a source, in front of the others when `first` is true and
    /// behind them otherwise. Clears every cached group.
    pub fn attach(&mut self, source: Arc<dyn ConfigSource>, first: bool) -> &mut Self {
        debug!(source = source.name(), first, "attaching config source");
        if first {
            self.sources.insert(0, source);
        } else {
            self.sources.push(source);
        }
        self.clear_cache();
        self
    }

    /// Detaches the first attached source that is the same allocation as
    /// `source`. Clears every cached group when one was removed.
    pub fn detach<S: ConfigSource + ?Sized>(&mut self, source: &Arc<S>) -> &mut Self {
        let target = Arc::as_ptr(source) as *const ();
        if let Some(index) = self
            .sources
            .iter()
            .position(|attached| Arc::as_ptr(attached) as *const () == target)
        {
            let removed = self.sources.remove(index);
            debug!(source = removed.name(), "detached config source");
            self.clear_cache();
        }
        self
    }

    /// The attached sources, highest precedence first.
    pub fn sources(&self) -> &[Arc<dyn ConfigSource>] {
        &self.sources
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Loads a group (`"database"`) or a value inside one
    /// (`"database.pool.size"`).
    ///
    /// A sub-path that does not resolve yields [`Value::Null`]. Source read
    /// failures abort the load and nothing is cached.
    pub fn load(&mut self, name: &str) -> Result<Resolved<'_>, ConfigError> {
        let (group, sub_path) = self.split_name(name)?;

        if !self.groups.contains_key(group) {
            let data = self.resolve(group)?;
            let resolved = ConfigGroup::new(group, data, self.resolver.clone());
            self.groups.insert(group.to_string(), resolved);
        }

        let cached = &self.groups[group];
        match sub_path {
            Some(path) => Ok(Resolved::Value(
                self.resolver
                    .path_in(cached.as_mapping(), path)
                    .unwrap_or(Value::Null),
            )),
            None => Ok(Resolved::Group(cached)),
        }
    }

    /// Loads a whole group. Names with a sub-path are rejected.
    pub fn group(&mut self, name: &str) -> Result<&ConfigGroup, ConfigError> {
        match self.load(name)? {
            Resolved::Group(group) => Ok(group),
            Resolved::Value(_) => Err(ConfigError::InvalidGroupName(name.to_string())),
        }
    }

    /// Sets one key of a group: the cached group is updated and the change
    /// is written to every writable source.
    ///
    /// The cached group keeps the new value even when some writes fail.
    pub fn set(&mut self, group: &str, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), ConfigError> {
        let key = key.into();
        let value = value.into();

        self.group(group)?;
        if let Some(cached) = self.groups.get_mut(group) {
            cached.set(key.clone(), value.clone());
        }

        self.write_config(group, &key, &value)
    }

    /// Writes every key of the resolved group to every writable source.
    ///
    /// Failures are collected across all keys and reported together.
    pub fn copy(&mut self, group: &str) -> Result<&mut Self, ConfigError> {
        let data = self.group(group)?.as_mapping().clone();

        let failures: Vec<WriteFailure> = data
            .iter()
            .flat_map(|(key, value)| self.fan_out(group, key, value))
            .collect();
        if !failures.is_empty() {
            return Err(ConfigError::SourceWrite {
                group: group.to_string(),
                failures,
            });
        }

        Ok(self)
    }

    /// Writes one key to every writable source.
    ///
    /// Sources without the writer capability are skipped. A failing source
    /// does not stop the others; all failures are returned together.
    pub fn write_config(&self, group: &str, key: &Key, value: &Value) -> Result<(), ConfigError> {
        let failures = self.fan_out(group, key, value);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::SourceWrite {
                group: group.to_string(),
                failures,
            })
        }
    }

    fn fan_out(&self, group: &str, key: &Key, value: &Value) -> Vec<WriteFailure> {
        let mut failures = Vec::new();

        for source in &self.sources {
            let Some(writer) = source.as_writer() else {
                continue;
            };
            if let Err(error) = writer.write(group, key, value) {
                warn!(source = source.name(), group, %key, %error, "config write failed");
                failures.push(WriteFailure {
                    source_name: source.name().to_string(),
                    key: key.clone(),
                    error,
                });
            }
        }

        failures
    }

    fn resolve(&self, group: &str) -> Result<Mapping, ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSourcesAttached);
        }

        let mut config = Mapping::new();
        let mut contributing = 0usize;

        // Lowest precedence first, so later merges win.
        for source in self.sources.iter().rev() {
            let Some(reader) = source.as_reader() else {
                continue;
            };
            let loaded = reader.load(group).map_err(|e| ConfigError::SourceRead {
                source_name: source.name().to_string(),
                group: group.to_string(),
                source: e,
            })?;

            if let Some(data) = loaded.filter(|data| !data.is_empty()) {
                trace!(source = source.name(), group, "merging config source");
                merge_into(&mut config, data);
                contributing += 1;
            }
        }

        debug!(group, contributing, "resolved config group");
        Ok(config)
    }

    fn split_name<'n>(&self, name: &'n str) -> Result<(&'n str, Option<&'n str>), ConfigError> {
        let (group, sub_path) = match name.split_once(self.resolver.delimiter()) {
            Some((group, sub_path)) => (group, Some(sub_path)),
            None => (name, None),
        };

        let malformed = group.is_empty()
            || group
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || c == '/' || c == '\\');
        if malformed {
            return Err(ConfigError::InvalidGroupName(name.to_string()));
        }

        Ok((group, sub_path))
    }

    fn clear_cache(&mut self) {
        if !self.groups.is_empty() {
            debug!(groups = self.groups.len(), "clearing cached config groups");
        }
        self.groups.clear();
    }
}
