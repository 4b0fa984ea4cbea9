//! Session-scoped scan results.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::record::RecordKey;
use crate::unify::UnifiedKey;

use super::graph::LinkGraph;

/// Existence state of one referenced path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Whether the path resolves in the overlay index.
    pub exists: bool,

    /// The path exactly as written in the container.
    pub raw: String,
}

impl Reference {
    pub fn new(exists: bool, raw: impl Into<String>) -> Self {
        Self {
            exists,
            raw: raw.into(),
        }
    }
}

/// References discovered under one record, keyed by unified path.
pub type ScanEntry = BTreeMap<UnifiedKey, Reference>;

/// A record discovered by the scanner.
#[derive(Debug, Clone)]
pub struct ScannedRecord {
    pub key: RecordKey,

    /// Class hash of the record body.
    pub class_hash: Option<u32>,

    /// Resolved record name, if the hash tables know it.
    pub name: Option<String>,

    /// Resolved record type name, if the hash tables know it.
    pub type_name: Option<String>,

    /// Namespace segment inserted into this record's asset paths.
    pub prefix: String,

    /// Asset references found under this record.
    pub references: ScanEntry,

    /// Container the record was first found in.
    pub container: UnifiedKey,
}

impl ScannedRecord {
    /// Name used for display and ordering.
    ///
    /// Falls back to the hex form of the key when the name is unknown.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.key.placeholder())
    }

    /// Number of references that do not resolve.
    pub fn missing_count(&self) -> usize {
        self.references.values().filter(|r| !r.exists).count()
    }
}

/// Everything the scanner has learned during the current session.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    pub(crate) records: HashMap<RecordKey, ScannedRecord>,
    pub(crate) all_containers: ScanEntry,
    pub(crate) scanned: HashSet<UnifiedKey>,
    pub(crate) roots: Vec<UnifiedKey>,
    pub(crate) links: LinkGraph,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records ordered by display name, then key.
    pub fn sorted_records(&self) -> Vec<&ScannedRecord> {
        let mut records: Vec<&ScannedRecord> = self.records.values().collect();
        records.sort_by_cached_key(|r| (r.display_name(), r.key));
        records
    }

    /// Look up a record by key.
    pub fn record(&self, key: RecordKey) -> Option<&ScannedRecord> {
        self.records.get(&key)
    }

    pub(crate) fn record_mut(&mut self, key: RecordKey) -> Option<&mut ScannedRecord> {
        self.records.get_mut(&key)
    }

    /// Iterate over records in arbitrary order.
    pub fn records(&self) -> impl Iterator<Item = &ScannedRecord> {
        self.records.values()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Existence state of every container link and scan root seen.
    pub fn all_containers(&self) -> &ScanEntry {
        &self.all_containers
    }

    /// Containers scanned as roots, in scan order.
    pub fn roots(&self) -> &[UnifiedKey] {
        &self.roots
    }

    /// Link graph between present containers.
    pub fn link_graph(&self) -> &LinkGraph {
        &self.links
    }

    /// Check if a container has been scanned this session.
    pub fn is_scanned(&self, key: &UnifiedKey) -> bool {
        self.scanned.contains(key)
    }

    /// Total number of references that do not resolve, links included.
    pub fn missing_count(&self) -> usize {
        self.records.values().map(ScannedRecord::missing_count).sum::<usize>()
            + self.all_containers.values().filter(|r| !r.exists).count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.scanned.is_empty()
    }

    /// Drop all scan results.
    pub fn clear(&mut self) {
        self.records.clear();
        self.all_containers.clear();
        self.scanned.clear();
        self.roots.clear();
        self.links.clear();
    }
}
