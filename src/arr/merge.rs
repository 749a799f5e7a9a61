//! Deep merge and restricted overwrite of mappings.

use super::value::{Mapping, Value};

/// Merges `overlay` into `base` and returns the result.
///
/// - Associative overlay: each entry replaces the base entry, except that
///   two mappings under the same key are merged recursively.
/// - List-shaped overlay: each element is appended unless an equal element
///   is already present (no coercion, so `1` and `1.0` differ).
///
/// ```
/// use dragon_cascade::arr::{merge, Mapping, Value};
///
/// let john: Mapping = [
///     ("name", Value::from("john")),
///     ("children", Value::from(vec!["fred", "paul", "sally", "jane"])),
/// ]
/// .into_iter()
/// .collect();
/// let mary: Mapping = [
///     ("name", Value::from("mary")),
///     ("children", Value::from(vec!["jane"])),
/// ]
/// .into_iter()
/// .collect();
///
/// let family = merge(john, mary);
/// assert_eq!(family.get(&"name".into()), Some(&Value::from("mary")));
/// assert_eq!(
///     family.get(&"children".into()),
///     Some(&Value::from(vec!["fred", "paul", "sally", "jane"]))
/// );
/// ```
pub fn merge(mut base: Mapping, overlay: Mapping) -> Mapping {
    merge_into(&mut base, overlay);
    base
}

/// Folds every overlay into `base`, left to right.
pub fn merge_all(mut base: Mapping, overlays: impl IntoIterator<Item = Mapping>) -> Mapping {
    for overlay in overlays {
        merge_into(&mut base, overlay);
    }
    base
}

/// In-place form of [`merge`].
pub fn merge_into(base: &mut Mapping, overlay: Mapping) {
    if overlay.is_list_shaped() {
        for value in overlay.into_values() {
            if !base.values().any(|existing| *existing == value) {
                base.push(value);
            }
        }
        return;
    }

    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Map(base_child)), Value::Map(overlay_child)) => {
                merge_into(base_child, overlay_child);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Replaces values of keys that exist in both mappings, one level deep.
/// Keys missing from `base` are never added.
pub fn overwrite(mut base: Mapping, overlay: Mapping) -> Mapping {
    overwrite_into(&mut base, overlay);
    base
}

/// Applies [`overwrite`] for every overlay, left to right.
pub fn overwrite_all(mut base: Mapping, overlays: impl IntoIterator<Item = Mapping>) -> Mapping {
    for overlay in overlays {
        overwrite_into(&mut base, overlay);
    }
    base
}

fn overwrite_into(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        if let Some(slot) = base.get_mut(&key) {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arr::Key;

    fn make_map(toml_str: &str) -> Mapping {
        Mapping::from(toml::from_str::<toml::Table>(toml_str).unwrap())
    }

    fn keys(map: &Mapping) -> Vec<Key> {
        map.keys().cloned().collect()
    }

    #[test]
    fn test_merge_nested_tables() {
        let base = make_map(
            r#"
            debug = true
            [server]
            host = "localhost"
            port = 8080
            "#,
        );
        let overlay = make_map(
            r#"
            [server]
            port = 9000
            "#,
        );
        let merged = merge(base, overlay);
        let expected = make_map(
            r#"
            debug = true
            [server]
            host = "localhost"
            port = 9000
            "#,
        );
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_overlay_wins_on_shape_mismatch() {
        let base = make_map(
            r#"
            [server]
            port = 8080
            "#,
        );
        let overlay = make_map(r#"server = "disabled""#);
        let merged = merge(base, overlay.clone());
        assert_eq!(merged, overlay);

        let base = make_map(r#"server = "disabled""#);
        let overlay = make_map("[server]\nport = 1");
        assert_eq!(merge(base, overlay.clone()), overlay);
    }

    #[test]
    fn test_list_overlay_appends_unique() {
        let base = make_map(r#"tags = ["a", "b"]"#);
        let overlay = make_map(r#"tags = ["b", "c", "a", "d"]"#);
        let merged = merge(base, overlay);
        assert_eq!(merged, make_map(r#"tags = ["a", "b", "c", "d"]"#));
    }

    #[test]
    fn test_list_dedup_is_strict() {
        let base = Mapping::list(vec![Value::Int(1)]);
        let overlay = Mapping::list(vec![Value::Float(1.0), Value::from("1"), Value::Int(1)]);
        let merged = merge(base, overlay);
        assert_eq!(
            merged,
            Mapping::list(vec![Value::Int(1), Value::Float(1.0), Value::from("1")])
        );
    }

    #[test]
    fn test_list_overlay_into_associative_base() {
        let mut base = Mapping::new();
        base.insert("name", "x");
        let merged = merge(base, Mapping::list(vec![Value::from("y")]));
        assert_eq!(keys(&merged), vec![Key::from("name"), Key::Int(0)]);
    }

    #[test]
    fn test_merge_is_idempotent_for_repeated_overlay() {
        let a = make_map(
            r#"
            tags = ["x"]
            [db]
            host = "a"
            "#,
        );
        let b = make_map(
            r#"
            tags = ["y", "x"]
            [db]
            port = 1
            "#,
        );
        let once = merge(a, b.clone());
        let twice = merge(once.clone(), b);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_all_folds_left_to_right() {
        let merged = merge_all(
            make_map("a = 1"),
            [make_map("a = 2\nb = 2"), make_map("b = 3")],
        );
        assert_eq!(merged, make_map("a = 2\nb = 3"));
    }

    #[test]
    fn test_overwrite_only_touches_existing_keys() {
        let base = make_map(
            r#"
            name = "john"
            mood = "happy"
            food = "bacon"
            "#,
        );
        let overlay = make_map(
            r#"
            name = "jack"
            food = "tacos"
            drink = "beer"
            "#,
        );
        let result = overwrite(base.clone(), overlay);
        assert_eq!(keys(&result), keys(&base));
        assert_eq!(
            result,
            make_map(
                r#"
                name = "jack"
                mood = "happy"
                food = "tacos"
                "#,
            )
        );
    }

    #[test]
    fn test_overwrite_does_not_recurse() {
        let base = make_map("[db]\nhost = \"a\"\nport = 1");
        let overlay = make_map("[db]\nhost = \"b\"");
        let result = overwrite(base, overlay.clone());
        assert_eq!(result, overlay);
    }

    #[test]
    fn test_overwrite_all() {
        let result = overwrite_all(
            make_map("a = 1\nb = 1"),
            [make_map("a = 2\nc = 2"), make_map("b = 3")],
        );
        assert_eq!(result, make_map("a = 2\nb = 3"));
    }
}
