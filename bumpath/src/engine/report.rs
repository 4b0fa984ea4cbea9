//! Results handed to the driving surface.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::merge::MergeOutcome;
use crate::rewrite::RewriteOutcome;
use crate::scan::{ScanEntry, ScanState};
use crate::unify::UnifiedKey;

/// One reference as shown to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceReport {
    pub raw: String,
    pub exists: bool,
    pub unified: String,
}

/// One scanned record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordReport {
    /// Record key in hex.
    pub key: String,
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub prefix: String,
    pub references: Vec<ReferenceReport>,
}

/// Scan results, records in display order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub records: Vec<RecordReport>,

    /// Every container link and root seen during the session.
    pub containers: Vec<ReferenceReport>,
}

impl ScanReport {
    pub fn from_state(state: &ScanState) -> Self {
        let records = state
            .sorted_records()
            .into_iter()
            .map(|record| RecordReport {
                key: record.key.placeholder(),
                name: record.name.clone(),
                type_name: record.type_name.clone(),
                prefix: record.prefix.clone(),
                references: references(&record.references),
            })
            .collect();

        Self {
            records,
            containers: references(state.all_containers()),
        }
    }

    /// Number of references that do not resolve, links included.
    pub fn missing_count(&self) -> usize {
        self.records
            .iter()
            .flat_map(|r| r.references.iter())
            .chain(self.containers.iter())
            .filter(|r| !r.exists)
            .count()
    }
}

fn references(entry: &ScanEntry) -> Vec<ReferenceReport> {
    entry
        .iter()
        .map(|(key, reference)| ReferenceReport {
            raw: reference.raw.clone(),
            exists: reference.exists,
            unified: key.to_string(),
        })
        .collect()
}

/// Merge results for one root.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub root: String,
    pub absorbed: usize,
    pub skipped: usize,
    pub records_added: usize,
}

impl MergeReport {
    pub(crate) fn from_outcome(root: &UnifiedKey, outcome: &MergeOutcome) -> Self {
        Self {
            root: root.to_string(),
            absorbed: outcome.absorbed.len(),
            skipped: outcome.skipped.len(),
            records_added: outcome.records_added,
        }
    }
}

/// Results of a rewrite, and of the merge when one was requested.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BumReport {
    pub copied: usize,
    pub skipped_missing: usize,
    pub containers_rewritten: usize,

    /// Unified key of every remaining output mapped to its file.
    pub outputs: BTreeMap<String, PathBuf>,

    pub merged: Vec<MergeReport>,
}

impl BumReport {
    pub(crate) fn new(rewrite: &RewriteOutcome, merged: Vec<MergeReport>) -> Self {
        Self {
            copied: rewrite.copied,
            skipped_missing: rewrite.skipped_missing,
            containers_rewritten: rewrite.containers_rewritten,
            outputs: rewrite
                .outputs
                .iter()
                .map(|(key, path)| (key.to_string(), path.clone()))
                .collect(),
            merged,
        }
    }
}
