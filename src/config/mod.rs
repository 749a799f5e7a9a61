//! Cascading configuration groups over pluggable sources.

mod env;
mod error;
mod file;
mod group;
mod registry;
mod source;

pub use env::EnvSource;
pub use error::{ConfigError, SourceError, WriteFailure};
pub use file::FileSource;
pub use group::ConfigGroup;
pub use registry::{ConfigRegistry, Resolved};
pub use source::{ConfigReader, ConfigSource, ConfigWriter, MemorySource};
