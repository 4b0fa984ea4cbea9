//! Folding a container's linked closure into itself.
//!
//! After a rewrite every container has its own output file. [`ClosureMerger`]
//! takes a root's output file, absorbs the records of every container the
//! root reaches through its links and drops the now-redundant link entries.
//! [`ClosureMerger::merge_roots`] merges every root first and deletes the
//! absorbed files afterwards, so roots sharing a linked container each
//! receive its records.
//!
//! Unlike scanning and rewriting, merging is best effort: a linked file that
//! cannot be decoded is logged and skipped while the rest of the closure is
//! still absorbed.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::codec::ContainerCodec;
use crate::error::{BumError, BumResult};
use crate::record::RecordKey;
use crate::scan::LinkGraph;
use crate::unify::{PathUnifier, UnifiedKey};

/// Every container transitively reachable from `root`, in depth-first
/// discovery order.
///
/// Each key appears once and `root` itself is excluded, even when a cycle
/// leads back to it.
pub fn flatten(root: &UnifiedKey, graph: &LinkGraph) -> Vec<UnifiedKey> {
    let mut visited = HashSet::new();
    visited.insert(root.clone());
    let mut closure = Vec::new();
    collect(root, graph, &mut visited, &mut closure);
    closure
}

fn collect(
    key: &UnifiedKey,
    graph: &LinkGraph,
    visited: &mut HashSet<UnifiedKey>,
    closure: &mut Vec<UnifiedKey>,
) {
    for link in graph.links(key) {
        if visited.insert(link.clone()) {
            closure.push(link.clone());
            collect(link, graph, visited, closure);
        }
    }
}

/// Result of merging one root.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub root: Option<UnifiedKey>,

    /// Containers whose records were absorbed.
    pub absorbed: Vec<UnifiedKey>,

    /// Containers skipped because their output could not be read, with the
    /// reason.
    pub skipped: Vec<(UnifiedKey, String)>,

    /// Records appended to the root.
    pub records_added: usize,

    /// Link entries removed from the root.
    pub links_removed: usize,
}

/// Merges a root container's link closure into the root's output file.
#[derive(Debug)]
pub struct ClosureMerger<'a> {
    unifier: &'a PathUnifier,
    codec: &'a dyn ContainerCodec,
}

impl<'a> ClosureMerger<'a> {
    pub fn new(unifier: &'a PathUnifier, codec: &'a dyn ContainerCodec) -> Self {
        Self { unifier, codec }
    }

    /// Merge the closure of `root` into its output file.
    ///
    /// `outputs` maps unified keys to the files written by the rewrite. Linked
    /// containers without an output were absent during the rewrite and are
    /// skipped. Records already present win over later duplicates.
    ///
    /// Absorbed files are left on disk.
    pub fn merge(
        &self,
        root: &UnifiedKey,
        outputs: &BTreeMap<UnifiedKey, PathBuf>,
        graph: &LinkGraph,
        ignore_missing: bool,
    ) -> BumResult<MergeOutcome> {
        let root_path = outputs
            .get(root)
            .ok_or_else(|| BumError::RootNotWritten { key: root.clone() })?;

        let mut merged = self
            .codec
            .decode(root_path)
            .map_err(|source| BumError::Decode {
                key: root.clone(),
                source,
            })?;

        let closure = flatten(root, graph);
        let closure_set: HashSet<&UnifiedKey> = closure.iter().collect();

        let mut outcome = MergeOutcome {
            root: Some(root.clone()),
            ..Default::default()
        };

        let before = merged.links.len();
        merged
            .links
            .retain(|link| !closure_set.contains(&self.unifier.unify(link)));
        outcome.links_removed = before - merged.links.len();

        let mut seen: HashSet<RecordKey> = merged.records.iter().map(|r| r.key).collect();

        for key in &closure {
            let Some(path) = outputs.get(key) else {
                if ignore_missing {
                    debug!(container = %key, "Linked container has no output, skipping");
                } else {
                    warn!(container = %key, "Linked container has no output, skipping");
                }
                continue;
            };

            let linked = match self.codec.decode(path) {
                Ok(container) => container,
                Err(e) => {
                    warn!(container = %key, error = %e, "Failed to read linked container, skipping");
                    outcome.skipped.push((key.clone(), e.to_string()));
                    continue;
                }
            };

            for record in linked.records {
                if seen.insert(record.key) {
                    merged.records.push(record);
                    outcome.records_added += 1;
                }
            }

            outcome.absorbed.push(key.clone());
        }

        self.codec
            .encode(&merged, root_path)
            .map_err(|source| BumError::Encode {
                path: root_path.clone(),
                source,
            })?;

        info!(
            root = %root,
            absorbed = outcome.absorbed.len(),
            skipped = outcome.skipped.len(),
            records_added = outcome.records_added,
            "Merged linked containers"
        );
        Ok(outcome)
    }

    /// Merge each root in order, then delete every absorbed file.
    ///
    /// A root absorbed by an earlier root is not merged on its own. Absorbed
    /// keys are removed from `outputs`.
    pub fn merge_roots(
        &self,
        roots: &[UnifiedKey],
        outputs: &mut BTreeMap<UnifiedKey, PathBuf>,
        graph: &LinkGraph,
        ignore_missing: bool,
    ) -> BumResult<Vec<MergeOutcome>> {
        let mut outcomes = Vec::new();
        let mut absorbed: BTreeSet<UnifiedKey> = BTreeSet::new();

        for root in roots {
            if absorbed.contains(root) {
                debug!(root = %root, "Root already absorbed by an earlier root");
                continue;
            }
            let outcome = self.merge(root, outputs, graph, ignore_missing)?;
            absorbed.extend(outcome.absorbed.iter().cloned());
            outcomes.push(outcome);
        }

        for key in &absorbed {
            let Some(path) = outputs.remove(key) else {
                continue;
            };
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove absorbed container");
            }
        }

        Ok(outcomes)
    }
}
