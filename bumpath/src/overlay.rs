//! Overlay index merging several source directories into one namespace.
//!
//! The overlay works like a stack of override layers. Directories are added
//! in priority order and the first directory to provide a file wins; later
//! directories only contribute keys that are not bound yet.
//!
//! ```text
//!   add_directories([mod_a, mod_b])
//!
//!   mod_a/assets/x.dds ──┐
//!   mod_a/data/root.bin ─┼─► files: UnifiedKey -> SourceEntry
//!   mod_b/assets/x.dds   │   (shadowed by mod_a)
//!   mod_b/data/lib.bin ──┘
//!
//!   candidates: { root.bin: false, lib.bin: false }
//! ```
//!
//! Files carrying the container extension are also tracked as scan
//! candidates, initially unselected.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;

use crate::unify::{PathUnifier, UnifiedKey};

/// Default container file extension.
pub const CONTAINER_EXTENSION: &str = ".bin";

/// Where a unified key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Real filesystem path of the file.
    pub absolute: PathBuf,

    /// Path relative to its source directory, forward-slash separated.
    pub relative: String,
}

impl SourceEntry {
    pub fn new(absolute: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self {
            absolute: absolute.into(),
            relative: relative.into(),
        }
    }
}

/// Merged, priority-ordered view of several source directories.
#[derive(Debug, Clone)]
pub struct OverlayIndex {
    /// Registered directories in priority order.
    directories: Vec<PathBuf>,

    /// Map from unified key to the winning source file.
    files: HashMap<UnifiedKey, SourceEntry>,

    /// Container files available for scanning and whether each is selected.
    candidates: BTreeMap<UnifiedKey, bool>,

    /// Lower-case extension identifying container files.
    container_extension: String,
}

impl OverlayIndex {
    /// Create an empty overlay using the default container extension.
    pub fn new() -> Self {
        Self::with_container_extension(CONTAINER_EXTENSION)
    }

    /// Create an empty overlay with a custom container extension.
    pub fn with_container_extension(extension: impl Into<String>) -> Self {
        Self {
            directories: Vec::new(),
            files: HashMap::new(),
            candidates: BTreeMap::new(),
            container_extension: extension.into().to_lowercase(),
        }
    }

    /// Add source directories in priority order.
    ///
    /// Directories that are already registered are skipped. Returns the
    /// number of newly bound keys.
    pub fn add_directories<P: AsRef<Path>>(
        &mut self,
        dirs: &[P],
        unifier: &PathUnifier,
    ) -> io::Result<usize> {
        let mut added = 0;
        for dir in dirs {
            added += self.add_directory(dir.as_ref(), unifier)?;
        }
        Ok(added)
    }

    /// Add one source directory below all previously registered ones.
    pub fn add_directory(&mut self, dir: &Path, unifier: &PathUnifier) -> io::Result<usize> {
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        if self.directories.contains(&dir) {
            debug!(dir = %dir.display(), "Source directory already indexed");
            return Ok(0);
        }

        let mut added = 0;
        self.add_directory_recursive(&dir, "", unifier, &mut added)?;
        self.directories.push(dir.clone());

        debug!(dir = %dir.display(), added = added, "Indexed source directory");
        Ok(added)
    }

    fn add_directory_recursive(
        &mut self,
        real_dir: &Path,
        relative_dir: &str,
        unifier: &PathUnifier,
        added: &mut usize,
    ) -> io::Result<()> {
        for entry in fs::read_dir(real_dir)? {
            let entry = entry?;
            let real_path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let relative = if relative_dir.is_empty() {
                name
            } else {
                format!("{}/{}", relative_dir, name)
            };

            if real_path.is_dir() {
                self.add_directory_recursive(&real_path, &relative, unifier, added)?;
                continue;
            }

            let key = unifier.unify(&relative);
            if self.files.contains_key(&key) {
                continue;
            }

            if self.is_container_path(&relative) {
                self.candidates.insert(key.clone(), false);
            }
            self.files
                .insert(key, SourceEntry::new(real_path, relative));
            *added += 1;
        }

        Ok(())
    }

    /// Check if a raw path names a container file.
    pub fn is_container_path(&self, raw: &str) -> bool {
        raw.to_lowercase().ends_with(&self.container_extension)
    }

    /// Container file extension in use.
    pub fn container_extension(&self) -> &str {
        &self.container_extension
    }

    /// Resolve a unified key to its source file.
    pub fn resolve(&self, key: &UnifiedKey) -> Option<&SourceEntry> {
        self.files.get(key)
    }

    /// Check if a unified key is present.
    pub fn contains(&self, key: &UnifiedKey) -> bool {
        self.files.contains_key(key)
    }

    /// Mark a candidate container as selected or not.
    ///
    /// Returns `false` if the key is not a candidate container.
    pub fn set_selected(&mut self, key: &UnifiedKey, selected: bool) -> bool {
        match self.candidates.get_mut(key) {
            Some(flag) => {
                *flag = selected;
                true
            }
            None => false,
        }
    }

    /// Select every candidate whose lower-cased relative path matches `pattern`.
    ///
    /// Returns the number of candidates matched.
    pub fn select_matching(&mut self, pattern: &Pattern) -> usize {
        let mut matched = 0;
        for (key, selected) in self.candidates.iter_mut() {
            let Some(entry) = self.files.get(key) else {
                continue;
            };
            if pattern.matches(&entry.relative.to_lowercase()) {
                *selected = true;
                matched += 1;
            }
        }
        matched
    }

    /// Select every candidate container.
    pub fn select_all(&mut self) {
        for selected in self.candidates.values_mut() {
            *selected = true;
        }
    }

    /// Selected containers, ordered by relative path.
    pub fn selected(&self) -> Vec<UnifiedKey> {
        let mut selected: Vec<&UnifiedKey> = self
            .candidates
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(key, _)| key)
            .collect();
        selected.sort_by_key(|key| self.files.get(*key).map(|e| e.relative.to_lowercase()));
        selected.into_iter().cloned().collect()
    }

    /// Iterate over candidate containers and their selection state.
    pub fn candidates(&self) -> impl Iterator<Item = (&UnifiedKey, &SourceEntry, bool)> {
        self.candidates.iter().filter_map(move |(key, selected)| {
            self.files.get(key).map(|entry| (key, entry, *selected))
        })
    }

    /// Registered directories in priority order.
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Number of bound keys.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Forget every directory, file and candidate.
    pub fn clear(&mut self) {
        self.directories.clear();
        self.files.clear();
        self.candidates.clear();
    }
}

impl Default for OverlayIndex {
    fn default() -> Self {
        Self::new()
    }
}
