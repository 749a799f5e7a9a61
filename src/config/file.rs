//! File-based configuration source.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::arr::{merge_into, Key, Mapping, Value};

use super::source::{ConfigReader, ConfigSource, ConfigWriter};
use super::SourceError;

/// A configuration source backed by `<group>.toml` files.
///
/// Several directories can be searched. They are listed lowest precedence
/// first: when more than one holds a file for the group, the files are
/// deep-merged in directory order. Writes go to the last directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    dirs: Vec<PathBuf>,
}

impl FileSource {
    /// Creates a source reading from a single directory.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            name: format!("file:{}", dir.display()),
            dirs: vec![dir],
        }
    }

    /// Adds a directory that takes precedence over the ones already added.
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dirs.push(dir.as_ref().to_path_buf());
        self
    }

    fn group_file(dir: &Path, group: &str) -> PathBuf {
        dir.join(format!("{group}.toml"))
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_reader(&self) -> Option<&dyn ConfigReader> {
        Some(self)
    }

    fn as_writer(&self) -> Option<&dyn ConfigWriter> {
        Some(self)
    }
}

impl ConfigReader for FileSource {
    fn load(&self, group: &str) -> Result<Option<Mapping>, SourceError> {
        let mut config: Option<Mapping> = None;

        for dir in &self.dirs {
            let path = Self::group_file(dir, group);
            if let Some(table) = load_config_file(&path)? {
                trace!(path = %path.display(), "loaded config file");
                merge_into(config.get_or_insert_with(Mapping::new), Mapping::from(table));
            }
        }

        Ok(config)
    }
}

impl ConfigWriter for FileSource {
    fn write(&self, group: &str, key: &Key, value: &Value) -> Result<(), SourceError> {
        let Some(dir) = self.dirs.last() else {
            return Ok(());
        };
        let path = Self::group_file(dir, group);
        let mut table = load_config_file(&path)?.unwrap_or_default();

        if value.is_null() {
            table.remove(&key.to_string());
        } else {
            table.insert(key.to_string(), value.to_toml()?);
        }

        let contents = toml::to_string(&table).map_err(|e| SourceError::SerializeError {
            path: path.clone(),
            source: e,
        })?;
        std::fs::write(&path, contents).map_err(|e| SourceError::WriteError { path, source: e })
    }
}

/// Loads and parses a TOML config file.
///
/// Returns `Ok(None)` if the file doesn't exist.
fn load_config_file(path: &Path) -> Result<Option<toml::Table>, SourceError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| SourceError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SourceError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn test_file_source_loads_group_file() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "app.toml", "key = \"value\"");

        let source = FileSource::new(dir.path());
        let config = source.load("app").unwrap().unwrap();

        assert_eq!(config.get(&Key::from("key")), Some(&Value::from("value")));
    }

    #[test]
    fn test_file_source_missing_group() {
        let dir = TempDir::new().unwrap();
        let source = FileSource::new(dir.path());

        assert!(source.load("app").unwrap().is_none());
    }

    #[test]
    fn test_file_source_parse_error() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "app.toml", "key = ");

        let source = FileSource::new(dir.path());
        let result = source.load("app");

        assert!(matches!(result, Err(SourceError::ParseError { .. })));
    }

    #[test]
    fn test_file_source_merges_directories_in_order() {
        let system = TempDir::new().unwrap();
        let app = TempDir::new().unwrap();
        write_file(
            &system,
            "db.toml",
            "host = \"localhost\"\nport = 5432\ndrivers = [\"pg\"]",
        );
        write_file(&app, "db.toml", "port = 6543\ndrivers = [\"mysql\"]");

        let source = FileSource::new(system.path()).with_dir(app.path());
        let config = source.load("db").unwrap().unwrap();

        let expected = Mapping::from(
            toml::from_str::<toml::Table>(
                "host = \"localhost\"\nport = 6543\ndrivers = [\"pg\", \"mysql\"]",
            )
            .unwrap(),
        );
        assert_eq!(config, expected);
    }

    #[test]
    fn test_file_source_write_updates_one_key() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "app.toml", "name = \"old\"\nkeep = 1");

        let source = FileSource::new(dir.path());
        source
            .write("app", &Key::from("name"), &Value::from("new"))
            .unwrap();
        source
            .write("app", &Key::from("keep"), &Value::Null)
            .unwrap();

        let config = source.load("app").unwrap().unwrap();
        assert_eq!(config.get(&Key::from("name")), Some(&Value::from("new")));
        assert!(!config.contains_key(&Key::from("keep")));
    }

    #[test]
    fn test_file_source_write_creates_file_in_last_dir() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();

        let source = FileSource::new(low.path()).with_dir(high.path());
        source
            .write("app", &Key::from("ports"), &Value::from(vec![80, 443]))
            .unwrap();

        assert!(!low.path().join("app.toml").exists());
        let written = std::fs::read_to_string(high.path().join("app.toml")).unwrap();
        let table: toml::Table = toml::from_str(&written).unwrap();
        assert_eq!(
            table.get("ports"),
            Some(&toml::Value::Array(vec![
                toml::Value::Integer(80),
                toml::Value::Integer(443)
            ]))
        );
    }

    #[test]
    fn test_file_source_write_error() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = dir.path().join("plain");
        std::fs::write(&not_a_dir, "").unwrap();

        let source = FileSource::new(&not_a_dir);
        let result = source.write("app", &Key::from("k"), &Value::Int(1));

        assert!(matches!(
            result,
            Err(SourceError::ReadError { .. }) | Err(SourceError::WriteError { .. })
        ));
    }
}
