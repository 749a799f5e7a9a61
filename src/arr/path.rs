//! Path-addressed reads and writes over nested values.
//!
//! A path is either a delimiter-joined string (`"theme.dark.color"`) or a
//! pre-split list of keys. All-digit segments address integer keys, and a
//! `*` segment fans out over every child of the current mapping.

use super::value::{Key, Mapping, Value};

/// A path given either joined or already split into keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    Joined(String),
    Keys(Vec<Key>),
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        PathSpec::Joined(path.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(path: String) -> Self {
        PathSpec::Joined(path)
    }
}

impl From<Vec<Key>> for PathSpec {
    fn from(keys: Vec<Key>) -> Self {
        PathSpec::Keys(keys)
    }
}

impl From<&[&str]> for PathSpec {
    fn from(segments: &[&str]) -> Self {
        PathSpec::Keys(segments.iter().map(|s| Key::from_segment(s)).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PathSpec {
    fn from(segments: [&str; N]) -> Self {
        PathSpec::from(&segments[..])
    }
}

/// Resolves paths with a configurable delimiter.
///
/// The default delimiter is `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    delimiter: String,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self {
            delimiter: ".".to_string(),
        }
    }
}

impl PathResolver {
    pub fn new(delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        assert!(!delimiter.is_empty(), "delimiter must not be empty");
        Self { delimiter }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Splits a joined path on the delimiter, normalizing digit segments.
    pub fn split(&self, path: &str) -> Vec<Key> {
        path.split(self.delimiter.as_str())
            .map(Key::from_segment)
            .collect()
    }

    /// Joins keys back into a path string.
    pub fn join(&self, keys: &[Key]) -> String {
        keys.iter()
            .map(Key::to_string)
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    /// Reads the value at `path`.
    ///
    /// Returns `None` when `container` is not a mapping or the path does not
    /// resolve. A joined path that exists literally as a key of `container`
    /// wins over traversal.
    pub fn path(&self, container: &Value, path: impl Into<PathSpec>) -> Option<Value> {
        let map = container.as_map()?;
        self.path_in(map, path)
    }

    /// Like [`path`](Self::path), with a fallback for misses.
    pub fn path_or(&self, container: &Value, path: impl Into<PathSpec>, default: Value) -> Value {
        self.path(container, path).unwrap_or(default)
    }

    /// Reads the value at `path` inside a mapping.
    pub fn path_in(&self, map: &Mapping, path: impl Into<PathSpec>) -> Option<Value> {
        let keys = match path.into() {
            PathSpec::Keys(keys) => keys.into_iter().map(Key::normalize).collect(),
            PathSpec::Joined(joined) => {
                if let Some(value) = map.get(&Key::from_segment(&joined)) {
                    return Some(value.clone());
                }
                self.split(self.trim(&joined))
            }
        };
        self.walk(map, &keys)
    }

    /// Writes `value` at `path`, creating intermediate mappings as needed.
    ///
    /// An intermediate key holding a non-mapping value is replaced by a
    /// mapping. An empty key list writes nothing.
    pub fn set_path(&self, container: &mut Mapping, path: impl Into<PathSpec>, value: impl Into<Value>) {
        let keys = match path.into() {
            PathSpec::Keys(keys) => keys.into_iter().map(Key::normalize).collect(),
            PathSpec::Joined(joined) => self.split(&joined),
        };
        let Some((last, parents)) = keys.split_last() else {
            return;
        };

        let mut current = container;
        for key in parents {
            let Some(child) = current.child_mapping(key.clone()) else {
                return;
            };
            current = child;
        }
        current.insert(last.clone(), value);
    }

    /// Resolves each path and collects the results into a new mapping,
    /// nested the same way the paths are.
    pub fn extract<P>(&self, container: &Value, paths: impl IntoIterator<Item = P>, default: &Value) -> Mapping
    where
        P: Into<PathSpec>,
    {
        let mut found = Mapping::new();
        for path in paths {
            let path = path.into();
            let value = self
                .path(container, path.clone())
                .unwrap_or_else(|| default.clone());
            self.set_path(&mut found, path, value);
        }
        found
    }

    fn trim<'p>(&self, path: &'p str) -> &'p str {
        let delimiter = self.delimiter.as_str();
        path.trim_start_matches(|c: char| c == ' ' || delimiter.contains(c))
            .trim_end_matches(|c: char| c == ' ' || c == '*' || delimiter.contains(c))
    }

    fn walk(&self, map: &Mapping, keys: &[Key]) -> Option<Value> {
        let mut current = map;
        let mut remaining = keys;

        while let Some((key, rest)) = remaining.split_first() {
            match current.get(key) {
                Some(value) if rest.is_empty() => return Some(value.clone()),
                Some(Value::Map(child)) => current = child,
                Some(_) => return None,
                None if key.is_wildcard() => return self.fan_out(current, rest),
                None => return None,
            }
            remaining = rest;
        }

        None
    }

    // Falsy hits are dropped along with misses.
    fn fan_out(&self, map: &Mapping, rest: &[Key]) -> Option<Value> {
        let remaining = self.join(rest);
        let found = Mapping::list(
            map.values()
                .filter_map(|child| self.path(child, remaining.as_str()))
                .filter(Value::is_truthy),
        );
        (!found.is_empty()).then_some(Value::Map(found))
    }
}

/// Single-level lookup by key existence.
pub fn get<'v>(container: &'v Value, key: impl Into<Key>) -> Option<&'v Value> {
    container.as_map()?.get(&key.into())
}

/// Single-level lookup with a fallback for missing keys.
pub fn get_or(container: &Value, key: impl Into<Key>, default: Value) -> Value {
    get(container, key).cloned().unwrap_or(default)
}

/// [`PathResolver::path`] with the default delimiter.
pub fn path(container: &Value, path: impl Into<PathSpec>) -> Option<Value> {
    PathResolver::default().path(container, path)
}

/// [`PathResolver::path_or`] with the default delimiter.
pub fn path_or(container: &Value, path: impl Into<PathSpec>, default: Value) -> Value {
    PathResolver::default().path_or(container, path, default)
}

/// [`PathResolver::set_path`] with the default delimiter.
pub fn set_path(container: &mut Mapping, path: impl Into<PathSpec>, value: impl Into<Value>) {
    PathResolver::default().set_path(container, path, value)
}

/// [`PathResolver::extract`] with the default delimiter.
pub fn extract<P: Into<PathSpec>>(container: &Value, paths: impl IntoIterator<Item = P>, default: &Value) -> Mapping {
    PathResolver::default().extract(container, paths, default)
}

/// Collects `row[key]` from every mapping-valued row that holds a non-null
/// value there.
pub fn pluck(container: &Mapping, key: impl Into<Key>) -> Mapping {
    let key = key.into();
    Mapping::list(
        container
            .values()
            .filter_map(|row| row.as_map()?.get(&key))
            .filter(|value| !value.is_null())
            .cloned(),
    )
}
