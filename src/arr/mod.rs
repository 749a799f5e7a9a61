//! Helpers for reading, writing, merging and reshaping nested values.

mod merge;
mod path;
mod transform;
mod value;

pub use merge::{merge, merge_all, merge_into, overwrite, overwrite_all};
pub use path::{extract, get, get_or, path, path_or, pluck, set_path, PathResolver, PathSpec};
pub use transform::{flatten, map, range, unshift};
pub use value::{Key, Mapping, TomlConversionError, Value};

/// Whether `map` is associative, i.e. not list-shaped.
pub fn is_assoc(map: &Mapping) -> bool {
    !map.is_list_shaped()
}
