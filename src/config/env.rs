use crate::arr::{Key, Mapping, PathResolver, PathSpec, Value};

use super::source::{ConfigReader, ConfigSource};
use super::SourceError;

/// A read-only source backed by environment variables.
///
/// `MYAPP__DATABASE__HOST=db` contributes `{host = "db"}` to the `database`
/// group when the prefix is `MYAPP` and the separator `__`. Segments are
/// lowercased and values are coerced to the most specific scalar type.
#[derive(Debug, Clone)]
pub struct EnvSource {
    name: String,
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            name: format!("env:{prefix}"),
            prefix,
            separator,
        }
    }

    fn load_from<I>(&self, vars: I, group: &str) -> Option<Mapping>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let group = group.to_lowercase();
        let resolver = PathResolver::default();
        let mut config: Option<Mapping> = None;

        for (key, value) in vars {
            let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };

            let mut segments = path_str.split(&self.separator).map(str::to_lowercase);
            if segments.next().as_deref() != Some(group.as_str()) {
                continue;
            }
            let path: Vec<Key> = segments.map(Key::from).collect();
            if path.is_empty() || path.iter().any(|key| key.as_str() == Some("")) {
                continue;
            }

            resolver.set_path(
                config.get_or_insert_with(Mapping::new),
                PathSpec::Keys(path),
                coerce_value(&value),
            );
        }

        config
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_reader(&self) -> Option<&dyn ConfigReader> {
        Some(self)
    }
}

impl ConfigReader for EnvSource {
    fn load(&self, group: &str) -> Result<Option<Mapping>, SourceError> {
        Ok(self.load_from(std::env::vars(), group))
    }
}

fn coerce_value(s: &str) -> Value {
    // Try boolean first (case-insensitive)
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
