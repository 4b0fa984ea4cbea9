//! Repathing session.
//!
//! [`BumpathEngine`] owns everything a session accumulates: the overlay
//! index, the hash tables and the scan state. The pipeline per invocation is
//! strictly scan, then rewrite, then (optionally) merge:
//!
//! ```no_run
//! use bumpath::codec::JsonCodec;
//! use bumpath::engine::{BumOptions, BumpathEngine};
//! use bumpath::settings::EngineSettings;
//!
//! # fn main() -> bumpath::BumResult<()> {
//! let mut engine = BumpathEngine::new(Box::new(JsonCodec::new()), EngineSettings::default());
//! engine.add_directories(&["mods/base", "mods/extra"])?;
//! engine.select_matching("data/characters/*/skins/*.bin")?;
//! engine.scan()?;
//! engine.set_prefix_all("bum7")?;
//! let report = engine.bum(&BumOptions::new("out").combine_linked(true))?;
//! println!("copied {} files", report.copied);
//! # Ok(())
//! # }
//! ```
//!
//! State is only discarded by [`BumpathEngine::reset`].

mod report;

pub use report::{BumReport, MergeReport, RecordReport, ReferenceReport, ScanReport};

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info};

use crate::codec::ContainerCodec;
use crate::error::{BumError, BumResult};
use crate::hashtables::HashTables;
use crate::merge::{flatten, ClosureMerger};
use crate::overlay::OverlayIndex;
use crate::record::RecordKey;
use crate::rewrite::{remove_empty_dirs, PrefixRewriter, RewriteOptions};
use crate::scan::{ReferenceScanner, ScanState};
use crate::settings::{validate_prefix, EngineSettings};
use crate::unify::{PathUnifier, UnifiedKey};

/// Options for [`BumpathEngine::bum`].
#[derive(Debug, Clone)]
pub struct BumOptions {
    pub output_root: PathBuf,
    pub ignore_missing: bool,
    pub combine_linked: bool,
}

impl BumOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ignore_missing: false,
            combine_linked: false,
        }
    }

    pub fn ignore_missing(mut self, ignore_missing: bool) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }

    pub fn combine_linked(mut self, combine_linked: bool) -> Self {
        self.combine_linked = combine_linked;
        self
    }
}

/// One repathing session.
#[derive(Debug)]
pub struct BumpathEngine {
    settings: EngineSettings,
    unifier: PathUnifier,
    overlay: OverlayIndex,
    hashtables: HashTables,
    codec: Box<dyn ContainerCodec>,
    state: ScanState,
}

impl BumpathEngine {
    pub fn new(codec: Box<dyn ContainerCodec>, settings: EngineSettings) -> Self {
        let overlay = OverlayIndex::with_container_extension(settings.container_extension.clone());
        Self {
            settings,
            unifier: PathUnifier::default(),
            overlay,
            hashtables: HashTables::new(),
            codec,
            state: ScanState::new(),
        }
    }

    /// Use a different unifier. Only meaningful before any directory is added.
    pub fn with_unifier(mut self, unifier: PathUnifier) -> Self {
        self.unifier = unifier;
        self
    }

    pub fn with_hash_tables(mut self, hashtables: HashTables) -> Self {
        self.hashtables = hashtables;
        self
    }

    /// Replace the hash tables. Records already scanned keep their names.
    pub fn set_hash_tables(&mut self, hashtables: HashTables) {
        self.hashtables = hashtables;
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn unifier(&self) -> &PathUnifier {
        &self.unifier
    }

    /// Register source directories, highest priority first.
    ///
    /// Returns the number of files added.
    pub fn add_directories<P: AsRef<Path>>(&mut self, dirs: &[P]) -> BumResult<usize> {
        let mut added = 0;
        for dir in dirs {
            let dir = dir.as_ref();
            added += self
                .overlay
                .add_directory(dir, &self.unifier)
                .map_err(|e| BumError::io(dir, e))?;
        }
        Ok(added)
    }

    pub fn overlay(&self) -> &OverlayIndex {
        &self.overlay
    }

    /// Toggle a candidate container by raw path.
    ///
    /// Returns `false` if the path is not a known container.
    pub fn select(&mut self, raw: &str, selected: bool) -> bool {
        let key = self.unifier.unify(raw);
        self.overlay.set_selected(&key, selected)
    }

    /// Select candidate containers matching a glob.
    pub fn select_matching(&mut self, pattern: &str) -> BumResult<usize> {
        let compiled = Pattern::new(&pattern.to_lowercase()).map_err(|e| {
            BumError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        let matched = self.overlay.select_matching(&compiled);
        debug!(pattern = %pattern, matched = matched, "Selected containers");
        Ok(matched)
    }

    pub fn select_all(&mut self) {
        self.overlay.select_all();
    }

    /// Scan every selected container.
    pub fn scan(&mut self) -> BumResult<ScanReport> {
        let roots = self.overlay.selected();
        let scanner = ReferenceScanner::new(
            &self.overlay,
            &self.unifier,
            self.codec.as_ref(),
            &self.hashtables,
            &self.settings,
        );
        scanner.scan(&roots, &mut self.state)?;
        Ok(self.report())
    }

    pub fn scan_state(&self) -> &ScanState {
        &self.state
    }

    /// Current scan results.
    pub fn report(&self) -> ScanReport {
        ScanReport::from_state(&self.state)
    }

    /// Assign a prefix to the given records.
    ///
    /// Returns the number of records updated; unknown keys are ignored.
    pub fn set_prefix(&mut self, keys: &[RecordKey], prefix: &str) -> BumResult<usize> {
        validate_prefix(prefix)?;
        let mut updated = 0;
        for key in keys {
            if let Some(record) = self.state.record_mut(*key) {
                record.prefix = prefix.to_string();
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Assign a prefix to every scanned record.
    pub fn set_prefix_all(&mut self, prefix: &str) -> BumResult<usize> {
        validate_prefix(prefix)?;
        for record in self.state.records.values_mut() {
            record.prefix = prefix.to_string();
        }
        Ok(self.state.record_count())
    }

    /// Find a scanned record by hex key or by name.
    ///
    /// Names are compared case-insensitively against resolved names, then
    /// hashed as a last resort.
    pub fn find_record(&self, key_or_name: &str) -> Option<RecordKey> {
        let trimmed = key_or_name.trim();

        if trimmed.len() == 8 {
            if let Ok(raw) = u32::from_str_radix(trimmed, 16) {
                if self.state.record(RecordKey(raw)).is_some() {
                    return Some(RecordKey(raw));
                }
            }
        }

        let by_name = self
            .state
            .records()
            .find(|r| {
                r.name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(trimmed))
            })
            .map(|r| r.key);
        if by_name.is_some() {
            return by_name;
        }

        let hashed = RecordKey::from_name(trimmed);
        self.state.record(hashed).map(|r| r.key)
    }

    /// Rewrite the scan results into `output_root`, then merge each root's
    /// link closure when requested.
    pub fn bum(&mut self, options: &BumOptions) -> BumResult<BumReport> {
        let rewriter =
            PrefixRewriter::new(&self.overlay, &self.unifier, self.codec.as_ref(), &self.settings);
        let mut outcome = rewriter.rewrite(
            &self.state,
            &RewriteOptions::new(&options.output_root).with_ignore_missing(options.ignore_missing),
        )?;

        let mut merged = Vec::new();
        if options.combine_linked {
            let merger = ClosureMerger::new(&self.unifier, self.codec.as_ref());
            let outcomes = merger.merge_roots(
                self.state.roots(),
                &mut outcome.outputs,
                self.state.link_graph(),
                options.ignore_missing,
            )?;
            for merge in &outcomes {
                if let Some(root) = &merge.root {
                    merged.push(MergeReport::from_outcome(root, merge));
                }
            }

            remove_empty_dirs(&options.output_root)?;
        }

        let report = BumReport::new(&outcome, merged);
        info!(
            output = %options.output_root.display(),
            copied = report.copied,
            merged = report.merged.len(),
            "Bum complete"
        );
        Ok(report)
    }

    /// Containers a root would absorb if merged.
    pub fn closure_of(&self, root: &UnifiedKey) -> Vec<String> {
        flatten(root, self.state.link_graph())
            .into_iter()
            .map(|k| {
                self.state
                    .all_containers()
                    .get(&k)
                    .map(|r| r.raw.clone())
                    .unwrap_or_else(|| k.to_string())
            })
            .collect()
    }

    /// Forget all directories and scan results.
    ///
    /// Settings and hash tables are kept.
    pub fn reset(&mut self) {
        self.overlay.clear();
        self.state.clear();
        info!("Session reset");
    }
}
