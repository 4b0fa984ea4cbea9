//! Copy-and-rewrite pass over a scan result.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codec::ContainerCodec;
use crate::error::{BumError, BumResult, ReferenceOwner};
use crate::overlay::OverlayIndex;
use crate::scan::{Reference, ScanState};
use crate::settings::EngineSettings;
use crate::unify::{normalize_separators, PathUnifier, UnifiedKey};

use super::paths::{output_location, prefix_path, remove_empty_dirs};

/// Options for one rewrite invocation.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Directory the prefixed files are written to.
    pub output_root: PathBuf,

    /// Skip absent references instead of failing.
    pub ignore_missing: bool,
}

impl RewriteOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ignore_missing: false,
        }
    }

    pub fn with_ignore_missing(mut self, ignore_missing: bool) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }
}

/// What a rewrite produced.
#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    /// Unified key of each written path mapped to its output file.
    ///
    /// Containers keep their original path, so their key is the same key
    /// the scanner used.
    pub outputs: BTreeMap<UnifiedKey, PathBuf>,

    /// Files copied.
    pub copied: usize,

    /// Absent references skipped because missing files were ignored.
    pub skipped_missing: usize,

    /// Copied containers whose contents were rewritten.
    pub containers_rewritten: usize,
}

/// Copies referenced files to prefixed locations and rewrites containers.
#[derive(Debug)]
pub struct PrefixRewriter<'a> {
    overlay: &'a OverlayIndex,
    unifier: &'a PathUnifier,
    codec: &'a dyn ContainerCodec,
    settings: &'a EngineSettings,
}

impl<'a> PrefixRewriter<'a> {
    pub fn new(
        overlay: &'a OverlayIndex,
        unifier: &'a PathUnifier,
        codec: &'a dyn ContainerCodec,
        settings: &'a EngineSettings,
    ) -> Self {
        Self {
            overlay,
            unifier,
            codec,
            settings,
        }
    }

    /// Copy and rewrite everything referenced by `state`.
    ///
    /// Records are processed in display order, then the container links.
    /// Unless `ignore_missing` is set, the first absent reference stops the
    /// rewrite; files copied before it stay on disk.
    pub fn rewrite(&self, state: &ScanState, options: &RewriteOptions) -> BumResult<RewriteOutcome> {
        if state.record_count() == 0 {
            return Err(BumError::EmptyScan);
        }

        fs::create_dir_all(&options.output_root)
            .map_err(|e| BumError::io(&options.output_root, e))?;

        let mut outcome = RewriteOutcome::default();

        for record in state.sorted_records() {
            for (key, reference) in &record.references {
                self.place(
                    ReferenceOwner::Record(record.key),
                    Some(&record.prefix),
                    key,
                    reference,
                    state,
                    options,
                    &mut outcome,
                )?;
            }
        }

        for (key, reference) in state.all_containers() {
            self.place(
                ReferenceOwner::AllContainers,
                None,
                key,
                reference,
                state,
                options,
                &mut outcome,
            )?;
        }

        remove_empty_dirs(&options.output_root)?;

        info!(
            output = %options.output_root.display(),
            copied = outcome.copied,
            skipped_missing = outcome.skipped_missing,
            containers = outcome.containers_rewritten,
            "Rewrite complete"
        );
        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        owner: ReferenceOwner,
        prefix: Option<&str>,
        key: &UnifiedKey,
        reference: &Reference,
        state: &ScanState,
        options: &RewriteOptions,
        outcome: &mut RewriteOutcome,
    ) -> BumResult<()> {
        let source = match self.overlay.resolve(key) {
            Some(source) if reference.exists => source,
            _ => {
                if options.ignore_missing {
                    debug!(owner = %owner, path = %reference.raw, "Skipping missing reference");
                    outcome.skipped_missing += 1;
                    return Ok(());
                }
                return Err(BumError::MissingReference {
                    owner,
                    path: reference.raw.clone(),
                });
            }
        };

        let is_container = self.overlay.is_container_path(&reference.raw);
        let relative = match prefix {
            Some(prefix) if !is_container => prefix_path(&reference.raw, prefix),
            _ => normalize_separators(&reference.raw),
        };

        let output_key = self.unifier.unify(&relative);
        if outcome.outputs.contains_key(&output_key) {
            return Ok(());
        }

        let destination = output_location(&options.output_root, &relative, self.unifier)?;
        copy_file(&source.absolute, &destination)?;
        outcome.copied += 1;
        debug!(from = %source.relative, to = %destination.display(), "Copied");

        if is_container {
            self.rewrite_container(key, &destination, state)?;
            outcome.containers_rewritten += 1;
        }

        outcome.outputs.insert(output_key, destination);
        Ok(())
    }

    /// Rewrite the asset references inside a copied container.
    ///
    /// Each record's present references get that record's prefix; absent
    /// references and container paths are left alone.
    fn rewrite_container(
        &self,
        key: &UnifiedKey,
        location: &Path,
        state: &ScanState,
    ) -> BumResult<()> {
        let mut container = self
            .codec
            .decode(location)
            .map_err(|source| BumError::Decode {
                key: key.clone(),
                source,
            })?;

        let mut rewritten = 0usize;
        for record in &mut container.records {
            let Some(scanned) = state.record(record.key) else {
                continue;
            };

            record.tree.for_each_path_string_mut(&mut |value| {
                if !self.settings.is_asset_reference(value) || self.overlay.is_container_path(value)
                {
                    return;
                }
                let unified = self.unifier.unify(value);
                if scanned.references.get(&unified).is_some_and(|r| r.exists) {
                    *value = prefix_path(value, &scanned.prefix);
                    rewritten += 1;
                }
            });
        }

        self.codec
            .encode(&container, location)
            .map_err(|source| BumError::Encode {
                path: location.to_path_buf(),
                source,
            })?;

        debug!(container = %location.display(), rewritten = rewritten, "Rewrote container");
        Ok(())
    }
}

fn copy_file(from: &Path, to: &Path) -> BumResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| BumError::io(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| BumError::io(from, e))?;
    Ok(())
}
