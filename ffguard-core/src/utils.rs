//! Small shared helpers.
//!
//! Path manipulation used by the command builders, the process runner, and
//! the [`SparseRange`] integer-set type used by the sample-rate tables.

pub mod command;
pub mod mocks;
pub mod sparse_range;

pub use command::{check_dependency, CommandOutput, ProcessRunner, SystemRunner};
pub use sparse_range::{SparseRange, Subrange};

use std::path::Path;

/// Splits a path's file name into a stem and an extension including the dot
/// (`"clip.mp4"` gives `("clip", ".mp4")`; no extension gives an empty one).
#[must_use]
pub fn split_file_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, extension)
}

/// Converts a path to an owned argument string for an argv vector.
#[must_use]
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_file_name() {
        assert_eq!(
            split_file_name(Path::new("/tmp/a/ForBiggerBlazes-[codec=h264].mp4")),
            ("ForBiggerBlazes-[codec=h264]".to_string(), ".mp4".to_string())
        );
        assert_eq!(
            split_file_name(Path::new("noext")),
            ("noext".to_string(), String::new())
        );
        assert_eq!(
            split_file_name(Path::new("archive.tar.gz")),
            ("archive.tar".to_string(), ".gz".to_string())
        );
    }
}
