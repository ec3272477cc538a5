//! Mapping keys into the destination tree.

use std::path::{Component, Path, PathBuf};

/// Maps `key` to a path below `dest_root`.
///
/// Each `/`-separated segment of the key becomes one path component. Empty
/// segments are dropped. Returns `None` if the key has no usable segment or
/// would escape `dest_root` (a `.` or `..` segment, or a segment that is not a
/// plain file name on this platform).
#[must_use]
pub fn local_path(dest_root: &Path, key: &str) -> Option<PathBuf> {
    let mut path = dest_root.to_path_buf();
    let mut segments = 0;

    for segment in key.split('/').filter(|s| !s.is_empty()) {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == segment => path.push(name),
            _ => return None,
        }
        segments += 1;
    }

    (segments > 0).then_some(path)
}

/// Returns true if a local copy of `key` with exactly `expected_size` bytes exists.
///
/// Only existence and byte length are compared; contents are not verified.
/// Any stat error, including not-found, yields `false`.
pub async fn is_duplicate(dest_root: &Path, key: &str, expected_size: u64) -> bool {
    let Some(path) = local_path(dest_root, key) else {
        return false;
    };
    tokio::fs::metadata(&path)
        .await
        .is_ok_and(|meta| meta.len() == expected_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_path_nested_key() {
        let root = Path::new("/backup");
        assert_eq!(
            local_path(root, "a/b/c.mp4"),
            Some(PathBuf::from("/backup/a/b/c.mp4"))
        );
    }

    #[test]
    fn test_local_path_ignores_empty_segments() {
        let root = Path::new("/backup");
        assert_eq!(
            local_path(root, "/a//b.txt"),
            Some(PathBuf::from("/backup/a/b.txt"))
        );
    }

    #[test]
    fn test_local_path_rejects_traversal() {
        let root = Path::new("/backup");
        assert_eq!(local_path(root, "../etc/passwd"), None);
        assert_eq!(local_path(root, "a/../../b"), None);
        assert_eq!(local_path(root, "a/./b"), None);
        assert_eq!(local_path(root, "///"), None);
        assert_eq!(local_path(root, ""), None);
    }

    #[tokio::test]
    async fn test_duplicate_exact_size() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("a")).unwrap();
        std::fs::write(temp_dir.path().join("a/b.mp4"), vec![0u8; 1024]).unwrap();

        assert!(is_duplicate(temp_dir.path(), "a/b.mp4", 1024).await);
        assert!(!is_duplicate(temp_dir.path(), "a/b.mp4", 1025).await);
        assert!(!is_duplicate(temp_dir.path(), "a/b.mp4", 1023).await);
    }

    #[tokio::test]
    async fn test_duplicate_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_duplicate(temp_dir.path(), "a/missing.mp4", 0).await);
    }

    #[tokio::test]
    async fn test_duplicate_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("empty"), b"").unwrap();
        assert!(is_duplicate(temp_dir.path(), "empty", 0).await);
    }
}
