//! Whole-mapping transformations.

use super::value::{Key, Mapping, Value};

/// Collapses nested mappings into a single level, discarding the keys of
/// the nesting.
///
/// An associative root keeps each leaf's own key (later leaves overwrite
/// earlier ones with the same key); a list-shaped root appends leaves
/// positionally. Integer-keyed leaves coming out of a nested level are
/// always appended.
///
/// Integer keys already in the result are not renumbered when a nested
/// level is appended, so an associative root keeps integer keys of its own
/// leaves as they were.
///
/// ```
/// use dragon_cascade::arr::{flatten, Mapping, Value};
///
/// let set: Mapping = [("one", "something")].into_iter().collect();
/// let nested: Mapping = [("set", Value::from(set)), ("two", Value::from("other"))]
///     .into_iter()
///     .collect();
///
/// let flat: Mapping = [("one", "something"), ("two", "other")].into_iter().collect();
/// assert_eq!(flatten(&nested), flat);
/// ```
pub fn flatten(container: &Mapping) -> Mapping {
    let keep_keys = !container.is_list_shaped();
    let mut flat = Mapping::new();

    for (key, value) in container {
        match value {
            Value::Map(child) => {
                for (child_key, leaf) in flatten(child) {
                    match child_key {
                        Key::Int(_) => {
                            flat.push(leaf);
                        }
                        child_key => {
                            flat.insert(child_key, leaf);
                        }
                    }
                }
            }
            leaf if keep_keys => {
                flat.insert(key.clone(), leaf.clone());
            }
            leaf => {
                flat.push(leaf.clone());
            }
        }
    }

    flat
}

/// Applies `callback` to every non-mapping leaf, recursing into nested
/// mappings. When `keys` is given, only leaves stored under one of those
/// keys are transformed.
pub fn map<F>(container: Mapping, keys: Option<&[Key]>, callback: &mut F) -> Mapping
where
    F: FnMut(Value) -> Value,
{
    let mut mapped = Mapping::new();
    for (key, value) in container {
        let value = match value {
            Value::Map(child) => Value::Map(map(child, keys, callback)),
            leaf if keys.map_or(true, |keys| keys.contains(&key)) => callback(leaf),
            leaf => leaf,
        };
        mapped.insert(key, value);
    }
    mapped
}

/// Builds `{step: step, 2*step: 2*step, ...}` up to and including `max`.
/// Empty when `step < 1`.
pub fn range(step: i64, max: i64) -> Mapping {
    let mut values = Mapping::new();
    if step < 1 {
        return values;
    }

    let mut current = step;
    while current <= max {
        values.insert(Key::Int(current), current);
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    values
}

/// Inserts an entry at the front of the mapping. An existing key keeps its
/// position and only has its value replaced.
pub fn unshift(container: &mut Mapping, key: impl Into<Key>, value: impl Into<Value>) {
    let key = key.into();
    if let Some(slot) = container.get_mut(&key) {
        *slot = value.into();
        return;
    }

    let rest = std::mem::take(container);
    container.insert(key, value);
    container.extend(rest);
}
