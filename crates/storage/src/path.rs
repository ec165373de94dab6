//! Path confinement.
//!
//! Rendered destination paths come partly from file metadata, which we don't
//! control. Before they are joined onto the destination root they are
//! reduced to plain components so they can never climb out of it.

use std::path::{Component, Path, PathBuf};

/// Reduces `path` to its normal components, resolving `..` lexically.
///
/// Root, prefix and `.` components are dropped and a `..` that would leave
/// the root is ignored, so the result is always relative and never escapes.
/// Unlike a validator this never fails; an empty result means the path had
/// no usable components.
///
/// ```
/// use std::path::Path;
/// use shootsort_storage::confine;
///
/// assert_eq!(confine("2024/01/photo.jpg"), Path::new("2024/01/photo.jpg"));
/// assert_eq!(confine("/abs//./photo.jpg"), Path::new("abs/photo.jpg"));
/// assert_eq!(confine("../../etc/passwd"), Path::new("etc/passwd"));
/// assert_eq!(confine("a/../b"), Path::new("b"));
/// ```
pub fn confine(path: impl AsRef<Path>) -> PathBuf {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => components.push(s),
            Component::ParentDir => {
                components.pop();
            },
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {},
        }
    }
    components.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths() {
        assert_eq!(confine(Path::new("a/b/c/file.jpg")), Path::new("a/b/c/file.jpg"));
        assert_eq!(confine(Path::new("simple.jpg")), Path::new("simple.jpg"));
    }

    #[test]
    fn test_path_normalization() {
        // Double slashes are normalized
        assert_eq!(confine(Path::new("a//b//c")), Path::new("a/b/c"));
        // Current directory references removed
        assert_eq!(confine(Path::new("a/./b/./c")), Path::new("a/b/c"));
        // Trailing slashes stripped
        assert_eq!(confine(Path::new("a/b/")), Path::new("a/b"));
    }

    #[test]
    fn test_traversal_is_clamped() {
        assert_eq!(confine(Path::new("../etc/passwd")), Path::new("etc/passwd"));
        assert_eq!(confine(Path::new("a/../../b")), Path::new("b"));
        assert_eq!(confine(Path::new("a/b/..")), Path::new("a"));
    }

    #[test]
    fn test_empty_paths() {
        assert_eq!(confine(Path::new("")), Path::new(""));
        assert_eq!(confine(Path::new("./")), Path::new(""));
        assert_eq!(confine(Path::new("//")), Path::new(""));
    }
}
