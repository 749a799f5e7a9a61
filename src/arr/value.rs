//! The nested value model: scalars and ordered mappings.
//!
//! There is no separate array type. A [`Mapping`] whose keys are exactly
//! `0..n` in insertion order is *list-shaped*; anything else is
//! *associative*. The shape is always derived from the key sequence.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

/// A mapping key: an integer or a string.
///
/// Conversions from strings normalize all-digit strings to [`Key::Int`],
/// so `"0"` and `0` address the same entry. Build a [`Key::Str`] directly
/// to bypass that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Builds a key from a path segment.
    pub fn from_segment(segment: &str) -> Self {
        if is_digits(segment) {
            if let Ok(index) = segment.parse::<i64>() {
                return Key::Int(index);
            }
        }
        Key::Str(segment.to_string())
    }

    /// Re-applies digit normalization to a string key.
    pub fn normalize(self) -> Self {
        match self {
            Key::Str(s) if is_digits(&s) => Key::from_segment(&s),
            key => key,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            Key::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Int(_) => None,
            Key::Str(s) => Some(s),
        }
    }

    /// Whether this key is the `*` fan-out token.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Key::Str(s) if s == "*")
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::from_segment(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s).normalize()
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::from_segment(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Int(i as i64)
    }
}

/// A dynamically-typed nested value.
///
/// Absence is expressed with `Option<Value>` at the API boundary, never
/// with a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(Mapping),
}

impl Value {
    /// Whether the value can be descended into.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Loose truthiness: null, `false`, zero, `""`, `"0"` and empty
    /// mappings are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s == "0"),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Converts to a TOML value.
    ///
    /// List-shaped mappings become arrays, other mappings become tables.
    /// Null entries of a table are dropped; a null anywhere else is an error.
    pub fn to_toml(&self) -> Result<toml::Value, TomlConversionError> {
        match self {
            Value::Null => Err(TomlConversionError("null".to_string())),
            Value::Bool(b) => Ok(toml::Value::Boolean(*b)),
            Value::Int(i) => Ok(toml::Value::Integer(*i)),
            Value::Float(f) => Ok(toml::Value::Float(*f)),
            Value::String(s) => Ok(toml::Value::String(s.clone())),
            Value::Map(map) if map.is_list_shaped() => map
                .values()
                .map(|item| match item {
                    Value::Null => Err(TomlConversionError("null array element".to_string())),
                    item => item.to_toml(),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(toml::Value::Array),
            Value::Map(map) => map.to_toml_table().map(toml::Value::Table),
        }
    }
}

/// A value that has no TOML representation.
#[derive(Debug, Error)]
#[error("cannot represent {0} as TOML")]
pub struct TomlConversionError(pub String);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Map(Mapping::list(items.into_iter().map(Into::into)))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => Value::Map(Mapping::list(items.into_iter().map(Value::from))),
            toml::Value::Table(table) => Value::Map(Mapping::from(table)),
        }
    }
}

impl From<toml::Table> for Value {
    fn from(table: toml::Table) -> Self {
        Value::Map(Mapping::from(table))
    }
}

/// An insertion-ordered mapping of [`Key`] to [`Value`].
///
/// Equality is order-sensitive: two mappings are equal only when they hold
/// the same entries in the same order.
#[derive(Debug, Clone)]
pub struct Mapping {
    entries: IndexMap<Key, Value>,
    // Key used by the next `push`; `None` once `i64::MAX` is taken.
    next_free: Option<i64>,
}

impl Default for Mapping {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            next_free: Some(0),
        }
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list-shaped mapping with keys `0..n`.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        let mut map = Self::new();
        for item in items {
            map.push(item);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the keys are exactly `0, 1, .., n-1` in order.
    ///
    /// An empty mapping is list-shaped.
    pub fn is_list_shaped(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(position, key)| *key == Key::Int(position as i64))
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Inserts or replaces an entry. A replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        self.reserve_index(&key);
        self.entries.insert(key, value.into())
    }

    /// Appends under the next free integer key: one past the largest
    /// non-negative integer key ever inserted, or `0`.
    ///
    /// Returns `false` and leaves the mapping untouched when `i64::MAX` is
    /// already taken.
    pub fn push(&mut self, value: impl Into<Value>) -> bool {
        let Some(index) = self.next_free else {
            return false;
        };
        self.next_free = index.checked_add(1);
        self.entries.insert(Key::Int(index), value.into());
        true
    }

    /// Removes an entry, preserving the order of the others. The next free
    /// integer key is not lowered.
    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Key, Value> {
        self.entries.values()
    }

    pub fn into_values(self) -> indexmap::map::IntoValues<Key, Value> {
        self.entries.into_values()
    }

    /// Converts to a TOML table regardless of shape, dropping null entries.
    pub fn to_toml_table(&self) -> Result<toml::Table, TomlConversionError> {
        let mut table = toml::Table::new();
        for (key, value) in self.iter() {
            if value.is_null() {
                continue;
            }
            table.insert(key.to_string(), value.to_toml()?);
        }
        Ok(table)
    }

    fn reserve_index(&mut self, key: &Key) {
        if let (Key::Int(index), Some(next)) = (key, self.next_free) {
            if *index >= next {
                self.next_free = index.checked_add(1);
            }
        }
    }

    /// Returns the mapping stored at `key`, creating it when the key is
    /// absent or holds a non-mapping value.
    pub(crate) fn child_mapping(&mut self, key: Key) -> Option<&mut Mapping> {
        self.reserve_index(&key);
        let slot = self
            .entries
            .entry(key)
            .or_insert_with(|| Value::Map(Mapping::new()));
        if !slot.is_container() {
            *slot = Value::Map(Mapping::new());
        }
        slot.as_map_mut()
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl From<toml::Table> for Mapping {
    fn from(table: toml::Table) -> Self {
        table
            .into_iter()
            .map(|(key, value)| (Key::from(key), Value::from(value)))
            .collect()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<Key>, V: Into<Value>> Extend<(K, V)> for Mapping {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Mapping {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_strings_normalize_to_int_keys() {
        assert_eq!(Key::from("0"), Key::Int(0));
        assert_eq!(Key::from("42"), Key::Int(42));
        assert_eq!(Key::from("-1"), Key::Str("-1".into()));
        assert_eq!(Key::from("0x1"), Key::Str("0x1".into()));
        assert_eq!(Key::from(""), Key::Str(String::new()));
        assert_eq!(Key::Str("7".into()).normalize(), Key::Int(7));
    }

    #[test]
    fn test_list_shape_is_derived_from_keys() {
        let list = Mapping::list(vec![Value::from("a"), Value::from("b")]);
        assert!(list.is_list_shaped());
        assert!(Mapping::new().is_list_shaped());

        let mut gapped = Mapping::new();
        gapped.insert(Key::Int(0), "a");
        gapped.insert(Key::Int(2), "b");
        assert!(!gapped.is_list_shaped());

        let mut reordered = Mapping::new();
        reordered.insert(Key::Int(1), "a");
        reordered.insert(Key::Int(0), "b");
        assert!(!reordered.is_list_shaped());

        let mut named = Mapping::new();
        named.insert("name", "a");
        assert!(!named.is_list_shaped());
    }

    #[test]
    fn test_push_uses_next_free_index() {
        let mut map = Mapping::new();
        map.insert("name", "x");
        map.push("first");
        map.insert(Key::Int(5), "five");
        map.push("sixth");

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![Key::from("name"), Key::Int(0), Key::Int(5), Key::Int(6)]
        );
    }

    #[test]
    fn test_list_builds_sequential_keys_at_scale() {
        let count = 50_000;
        let list = Mapping::list((0..count).map(Value::Int));

        assert_eq!(list.len(), count as usize);
        assert!(list.is_list_shaped());
        assert_eq!(list.get(&Key::Int(count - 1)), Some(&Value::Int(count - 1)));

        let from_toml = Value::from(toml::Value::Array(
            (0..count).map(toml::Value::Integer).collect(),
        ));
        assert_eq!(from_toml, Value::Map(list));
    }

    #[test]
    fn test_push_after_remove_does_not_reuse_index() {
        let mut map = Mapping::list(vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        map.remove(&Key::Int(2));
        assert!(map.push("d"));

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Key::Int(0), Key::Int(1), Key::Int(3)]);
    }

    #[test]
    fn test_push_refuses_when_max_index_taken() {
        let mut map = Mapping::new();
        map.insert(Key::Int(i64::MAX), "existing");

        assert!(!map.push("new"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Key::Int(i64::MAX)), Some(&Value::from("existing")));
    }

    #[test]
    fn test_push_ignores_negative_keys() {
        let mut map = Mapping::new();
        map.insert(Key::Int(-5), "negative");
        map.push("zero");
        assert_eq!(map.get(&Key::Int(0)), Some(&Value::from("zero")));
    }

    #[test]
    fn test_child_mapping_replaces_scalar() {
        let mut map = Mapping::new();
        map.insert("a", "scalar");
        map.child_mapping(Key::from("a")).unwrap().insert("b", 1);
        map.child_mapping(Key::Int(4)).unwrap();
        assert!(map.push("after"));

        assert_eq!(
            map.get(&Key::from("a")),
            Some(&Value::Map([("b", 1)].into_iter().collect()))
        );
        assert_eq!(map.get(&Key::Int(5)), Some(&Value::from("after")));
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let ab: Mapping = [("a", 1), ("b", 2)].into_iter().collect();
        let ba: Mapping = [("b", 2), ("a", 1)].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn test_insert_replacing_keeps_position() {
        let mut map: Mapping = [("a", 1), ("b", 2)].into_iter().collect();
        map.insert("a", 10);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("a"), Key::from("b")]);
        assert_eq!(map.get(&Key::from("a")), Some(&Value::Int(10)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::Map(Mapping::new()).is_truthy());
        assert!(Value::from("red").is_truthy());
        assert!(Value::Int(-1).is_truthy());
    }

    #[test]
    fn test_from_toml_table() {
        let table: toml::Table = toml::from_str(
            r#"
            name = "app"
            ports = [80, 443]

            [db]
            host = "localhost"
            "#,
        )
        .unwrap();
        let value = Value::from(table);
        let map = value.as_map().unwrap();

        let ports = map.get(&Key::from("ports")).unwrap().as_map().unwrap();
        assert!(ports.is_list_shaped());
        assert_eq!(ports.get(&Key::Int(1)), Some(&Value::Int(443)));

        let db = map.get(&Key::from("db")).unwrap().as_map().unwrap();
        assert_eq!(db.get(&Key::from("host")), Some(&Value::from("localhost")));
    }

    #[test]
    fn test_to_toml_drops_null_table_entries() {
        let mut map = Mapping::new();
        map.insert("kept", "yes");
        map.insert("dropped", Value::Null);
        map.insert("list", vec![1, 2]);

        let table = map.to_toml_table().unwrap();
        assert_eq!(table.get("kept"), Some(&toml::Value::String("yes".into())));
        assert!(table.get("dropped").is_none());
        assert_eq!(
            table.get("list"),
            Some(&toml::Value::Array(vec![
                toml::Value::Integer(1),
                toml::Value::Integer(2)
            ]))
        );
    }

    #[test]
    fn test_to_toml_rejects_null_in_list() {
        let list = Value::from(vec![Value::Int(1), Value::Null]);
        assert!(list.to_toml().is_err());
    }
}
