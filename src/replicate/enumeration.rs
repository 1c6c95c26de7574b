use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recursively enumerate regular files under `root`. Unreadable entries are
/// logged and skipped; symlinks are not followed. Sorted for a stable
/// dispatch order.
pub fn enumerate_source_tree(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("skipping unreadable entry under {}: {}", root.display(), e);
            }
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_tree() -> PathBuf {
        let root = std::env::temp_dir().join(format!("xrdsync_enum_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("a/b")).expect("mkdir");
        std::fs::write(root.join("top.root"), b"1").expect("write");
        std::fs::write(root.join("a/mid.root"), b"22").expect("write");
        std::fs::write(root.join("a/b/leaf.root"), b"333").expect("write");
        root
    }

    #[test]
    fn finds_only_regular_files_recursively() {
        let root = scratch_tree();
        let files = enumerate_source_tree(&root);
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.is_file()));
        assert!(files.iter().any(|f| f.ends_with("a/b/leaf.root")));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_root_yields_empty_set() {
        let root = std::env::temp_dir().join(format!("xrdsync_enum_none_{}", std::process::id()));
        assert!(enumerate_source_tree(&root).is_empty());
    }
}
