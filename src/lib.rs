//! Path-addressable nested data and cascading configuration.
//!
//! [`arr`] reads, writes, merges and flattens nested [`Value`]s by
//! delimiter-joined paths. [`config`] layers named sources into one
//! resolved [`ConfigGroup`] per group name, using [`arr::merge`] for
//! precedence.

pub mod arr;
pub mod config;

pub use arr::{Key, Mapping, PathResolver, PathSpec, Value};
pub use config::{ConfigError, ConfigGroup, ConfigRegistry, ConfigSource, Resolved, SourceError};
