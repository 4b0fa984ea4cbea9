//! Reverse lookup tables for hashed record names and record types.
//!
//! Tables use the community text format, one `<hex hash> <name>` pair per
//! line:
//!
//! ```text
//! 0d5e3c2f Characters/Ahri/Skins/Skin0
//! 1a2b3c4d SkinCharacterDataProperties
//! ```
//!
//! Lookups are best-effort. A missing table or an unknown hash yields `None`
//! and never fails a scan.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace};

use crate::record::RecordKey;

/// File holding record (entry) names.
pub const ENTRIES_FILE: &str = "hashes.binentries.txt";

/// File holding record type (class) names.
pub const TYPES_FILE: &str = "hashes.bintypes.txt";

/// Reverse lookup tables for record keys and class hashes.
#[derive(Debug, Clone, Default)]
pub struct HashTables {
    entries: HashMap<u32, String>,
    types: HashMap<u32, String>,
}

impl HashTables {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the entry and type tables from a directory.
    ///
    /// Either file may be absent.
    pub fn load_dir(dir: &Path) -> io::Result<Self> {
        let mut tables = Self::new();

        let entries_path = dir.join(ENTRIES_FILE);
        if entries_path.exists() {
            tables.entries = load_table(&entries_path)?;
        } else {
            debug!(path = %entries_path.display(), "Record name table not found");
        }

        let types_path = dir.join(TYPES_FILE);
        if types_path.exists() {
            tables.types = load_table(&types_path)?;
        } else {
            debug!(path = %types_path.display(), "Record type table not found");
        }

        debug!(
            entries = tables.entries.len(),
            types = tables.types.len(),
            "Loaded hash tables"
        );
        Ok(tables)
    }

    /// Register a record name.
    pub fn insert_entry(&mut self, name: impl Into<String>) -> RecordKey {
        let name = name.into();
        let key = RecordKey::from_name(&name);
        self.entries.insert(key.0, name);
        key
    }

    /// Register a record type name for a class hash.
    pub fn insert_type(&mut self, class_hash: u32, name: impl Into<String>) {
        self.types.insert(class_hash, name.into());
    }

    /// Resolve a record key to its name.
    pub fn entry_name(&self, key: RecordKey) -> Option<&str> {
        self.entries.get(&key.0).map(String::as_str)
    }

    /// Resolve a class hash to its type name.
    pub fn type_name(&self, class_hash: u32) -> Option<&str> {
        self.types.get(&class_hash).map(String::as_str)
    }

    /// Number of known names across both tables.
    pub fn len(&self) -> usize {
        self.entries.len() + self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_table(path: &Path) -> io::Result<HashMap<u32, String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut table = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        let Some((hex, name)) = line.trim_end().split_once(' ') else {
            continue;
        };
        match u32::from_str_radix(hex, 16) {
            Ok(hash) => {
                table.insert(hash, name.to_string());
            }
            Err(e) => {
                trace!(line = %line, error = %e, "Skipping malformed hash table line");
            }
        }
    }

    Ok(table)
}
