//! Output path computation and cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{BumError, BumResult};
use crate::unify::{normalize_separators, PathUnifier};

/// Longest file name written as-is.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Insert `prefix` after the first segment of `raw`.
///
/// ```
/// use bumpath::rewrite::prefix_path;
///
/// assert_eq!(
///     prefix_path("assets/characters/foo/bar.tex", "bum7"),
///     "assets/bum7/characters/foo/bar.tex"
/// );
/// assert_eq!(prefix_path("plainname", "x"), "x/plainname");
/// ```
pub fn prefix_path(raw: &str, prefix: &str) -> String {
    let normalized = normalize_separators(raw);
    match normalized.split_once('/') {
        Some((first, rest)) => format!("{}/{}/{}", first, prefix, rest),
        None => format!("{}/{}", prefix, normalized),
    }
}

/// Compute where a relative path is written under `output_root`.
///
/// The path is lower-cased. When its file name is longer than
/// [`MAX_FILE_NAME_LEN`] the file is written as `<hash token><ext>` directly
/// under the output root instead.
pub fn output_location(
    output_root: &Path,
    relative: &str,
    unifier: &PathUnifier,
) -> BumResult<PathBuf> {
    let lowered = normalize_separators(relative).to_lowercase();
    let segments: Vec<&str> = lowered
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    let file_name = segments.last().copied().unwrap_or_default();

    if file_name.chars().count() <= MAX_FILE_NAME_LEN {
        let mut location = output_root.to_path_buf();
        location.extend(segments);
        return Ok(location);
    }

    let extension = Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let token = unifier
        .hash_token(relative)
        .map_err(|source| BumError::Hash {
            path: relative.to_string(),
            source,
        })?;

    Ok(output_root.join(format!("{}{}", token, extension)))
}

/// Remove directories under `root` that contain no files.
///
/// `root` itself is kept. Returns the number of directories removed.
pub fn remove_empty_dirs(root: &Path) -> BumResult<usize> {
    if !root.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    prune(root, &mut removed).map_err(|e| BumError::io(root, e))?;
    Ok(removed)
}

/// Returns whether `dir` is empty after pruning its children.
fn prune(dir: &Path, removed: &mut usize) -> io::Result<bool> {
    let mut empty = true;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && prune(&path, removed)? {
            fs::remove_dir(&path)?;
            *removed += 1;
        } else {
            empty = false;
        }
    }
    Ok(empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_prefix_inserted_after_first_segment() {
        assert_eq!(prefix_path("assets/foo/bar", "x"), "assets/x/foo/bar");
        assert_eq!(prefix_path("ASSETS\\Foo\\Bar.dds", "x"), "ASSETS/x/Foo/Bar.dds");
    }

    #[test]
    fn test_prefix_without_separator() {
        assert_eq!(prefix_path("plainname", "x"), "x/plainname");
    }

    #[test]
    fn test_output_location_is_lowercase() {
        let unifier = PathUnifier::default();
        let location =
            output_location(Path::new("/out"), "ASSETS/bum/Foo/Bar.DDS", &unifier).unwrap();
        assert_eq!(location, PathBuf::from("/out/assets/bum/foo/bar.dds"));
    }

    #[test]
    fn test_output_location_drops_parent_segments() {
        let unifier = PathUnifier::default();
        let location = output_location(Path::new("/out"), "assets/../../etc/x.dds", &unifier).unwrap();
        assert_eq!(location, PathBuf::from("/out/assets/etc/x.dds"));
    }

    #[test]
    fn test_long_file_name_falls_back_to_hash() {
        let unifier = PathUnifier::default();
        let long_name = format!("{}.dds", "a".repeat(300));
        let relative = format!("assets/bum/{}", long_name);

        let location = output_location(Path::new("/out"), &relative, &unifier).unwrap();
        let expected_token = unifier.hash_token(&relative).unwrap();
        assert_eq!(
            location,
            PathBuf::from(format!("/out/{}.dds", expected_token))
        );

        let again = output_location(Path::new("/out"), &relative, &unifier).unwrap();
        assert_eq!(location, again);

        let name = location.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(unifier.unify(&name), unifier.unify(&relative));
    }

    #[test]
    fn test_name_at_limit_is_kept() {
        let unifier = PathUnifier::default();
        let name = format!("{}.dds", "b".repeat(MAX_FILE_NAME_LEN - 4));
        let location =
            output_location(Path::new("/out"), &format!("assets/{}", name), &unifier).unwrap();
        assert_eq!(location, PathBuf::from("/out/assets").join(&name));
    }

    #[test]
    fn test_remove_empty_dirs_keeps_files_and_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::fs::create_dir_all(root.join("d/e")).unwrap();
        std::fs::write(root.join("d/e/keep.dds"), b"x").unwrap();

        let removed = remove_empty_dirs(root).unwrap();
        assert_eq!(removed, 3);
        assert!(!root.join("a").exists());
        assert!(root.join("d/e/keep.dds").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_remove_empty_dirs_missing_root() {
        let temp = TempDir::new().unwrap();
        assert_eq!(remove_empty_dirs(&temp.path().join("none")).unwrap(), 0);
    }

    proptest! {
        #[test]
        fn prop_prefix_is_second_segment(
            first in "[a-z]{1,8}",
            rest in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
            prefix in "[a-z0-9]{1,8}",
        ) {
            let raw = format!("{}/{}", first, rest);
            let prefixed = prefix_path(&raw, &prefix);
            let segments: Vec<&str> = prefixed.split('/').collect();
            prop_assert_eq!(segments[0], first.as_str());
            prop_assert_eq!(segments[1], prefix.as_str());
            prop_assert_eq!(segments[2..].join("/"), rest);
        }
    }
}
