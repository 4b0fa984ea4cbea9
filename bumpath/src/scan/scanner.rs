//! Depth-first container and record scanner.

use tracing::{debug, info};

use crate::codec::ContainerCodec;
use crate::error::{BumError, BumResult};
use crate::hashtables::HashTables;
use crate::overlay::OverlayIndex;
use crate::record::Record;
use crate::settings::EngineSettings;
use crate::unify::{normalize_separators, PathUnifier, UnifiedKey};

use super::state::{Reference, ScanState, ScannedRecord};

/// Marker preceding the character name in character container paths.
const CHARACTERS_MARKER: &str = "characters/";

/// Check if a link points at the linking character's own skin container.
///
/// The link is a self-skin link when the first two path segments after
/// `characters/` are the same name, e.g. `data/characters/ahri/ahri.bin`.
///
/// ```
/// use bumpath::scan::is_self_skin_link;
///
/// assert!(is_self_skin_link("DATA/Characters/Ahri/Ahri.bin"));
/// assert!(!is_self_skin_link("data/characters/ahri/skins/skin1.bin"));
/// assert!(!is_self_skin_link("data/shared/common.bin"));
/// ```
pub fn is_self_skin_link(raw: &str) -> bool {
    let lowered = normalize_separators(raw).to_lowercase();
    let Some((_, rest)) = lowered.split_once(CHARACTERS_MARKER) else {
        return false;
    };
    let rest = rest.strip_suffix(".bin").unwrap_or(rest);
    let mut segments = rest.split('/');
    match (segments.next(), segments.next()) {
        (Some(first), Some(second)) => !first.is_empty() && first == second,
        _ => false,
    }
}

/// Walks containers and records, filling a [`ScanState`].
///
/// The scanner borrows the session's collaborators; all results go into the
/// state passed to [`scan`](Self::scan).
#[derive(Debug)]
pub struct ReferenceScanner<'a> {
    overlay: &'a OverlayIndex,
    unifier: &'a PathUnifier,
    codec: &'a dyn ContainerCodec,
    hashtables: &'a HashTables,
    settings: &'a EngineSettings,
}

impl<'a> ReferenceScanner<'a> {
    pub fn new(
        overlay: &'a OverlayIndex,
        unifier: &'a PathUnifier,
        codec: &'a dyn ContainerCodec,
        hashtables: &'a HashTables,
        settings: &'a EngineSettings,
    ) -> Self {
        Self {
            overlay,
            unifier,
            codec,
            hashtables,
            settings,
        }
    }

    /// Scan each root container and everything it links to.
    ///
    /// Containers already scanned in this session are not scanned again.
    /// The first decode failure stops the scan.
    pub fn scan(&self, roots: &[UnifiedKey], state: &mut ScanState) -> BumResult<()> {
        for root in roots {
            let source = self
                .overlay
                .resolve(root)
                .ok_or_else(|| BumError::MissingContainer { key: root.clone() })?;

            if !state.roots.contains(root) {
                state.roots.push(root.clone());
            }
            state
                .all_containers
                .insert(root.clone(), Reference::new(true, source.relative.clone()));

            self.scan_container(root, state)?;
        }

        info!(
            roots = roots.len(),
            containers = state.scanned.len(),
            records = state.record_count(),
            missing = state.missing_count(),
            "Scan complete"
        );
        Ok(())
    }

    /// A container whose scan fails, or whose linked containers fail, is not
    /// marked scanned, so the next scan reports the failure again.
    fn scan_container(&self, key: &UnifiedKey, state: &mut ScanState) -> BumResult<()> {
        if !state.scanned.insert(key.clone()) {
            return Ok(());
        }

        let result = self.scan_contents(key, state);
        if result.is_err() {
            state.scanned.remove(key);
        }
        result
    }

    fn scan_contents(&self, key: &UnifiedKey, state: &mut ScanState) -> BumResult<()> {
        let source = self
            .overlay
            .resolve(key)
            .ok_or_else(|| BumError::MissingContainer { key: key.clone() })?;
        debug!(container = %source.relative, "Scanning container");

        let container = self
            .codec
            .decode(&source.absolute)
            .map_err(|source| BumError::Decode {
                key: key.clone(),
                source,
            })?;

        for link in &container.links {
            if is_self_skin_link(link) {
                debug!(link = %link, "Skipping self-skin link");
                continue;
            }

            let link_key = self.unifier.unify(link);
            let exists = self.overlay.contains(&link_key);
            state
                .all_containers
                .insert(link_key.clone(), Reference::new(exists, link.as_str()));

            if exists {
                state.links.add_edge(key, &link_key);
                self.scan_container(&link_key, state)?;
            } else {
                debug!(link = %link, "Linked container not found");
            }
        }

        for record in &container.records {
            self.scan_record(record, key, state);
        }

        Ok(())
    }

    fn scan_record(&self, record: &Record, container: &UnifiedKey, state: &mut ScanState) {
        let entry = state
            .records
            .entry(record.key)
            .or_insert_with(|| self.new_scanned_record(record, container));

        record.tree.for_each_path_string(&mut |value| {
            if !self.settings.is_asset_reference(value) {
                return;
            }
            let unified = self.unifier.unify(value);
            let exists = self.overlay.contains(&unified);
            entry.references.insert(unified, Reference::new(exists, value));
        });
    }

    fn new_scanned_record(&self, record: &Record, container: &UnifiedKey) -> ScannedRecord {
        let class_hash = record.class_hash();
        ScannedRecord {
            key: record.key,
            class_hash,
            name: self.hashtables.entry_name(record.key).map(str::to_string),
            type_name: class_hash
                .and_then(|hash| self.hashtables.type_name(hash))
                .map(str::to_string),
            prefix: self.settings.default_prefix.clone(),
            references: Default::default(),
            container: container.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use proptest::prelude::*;
    use tempfile::TempDir;

    use crate::codec::JsonCodec;
    use crate::record::{Container, Field, FieldTree, RecordKey};

    fn write_container(root: &Path, relative: &str, container: &Container) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        JsonCodec::new().encode(container, &path).unwrap();
    }

    fn write_asset(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, relative.as_bytes()).unwrap();
    }

    struct Fixture {
        _temp: TempDir,
        overlay: OverlayIndex,
        unifier: PathUnifier,
        hashtables: HashTables,
        settings: EngineSettings,
    }

    impl Fixture {
        fn new(build: impl FnOnce(&Path)) -> Self {
            let temp = TempDir::new().unwrap();
            build(temp.path());
            let unifier = PathUnifier::default();
            let mut overlay = OverlayIndex::new();
            overlay.add_directories(&[temp.path()], &unifier).unwrap();
            Self {
                _temp: temp,
                overlay,
                unifier,
                hashtables: HashTables::new(),
                settings: EngineSettings::default(),
            }
        }

        fn scan(&self, roots: &[&str]) -> BumResult<ScanState> {
            let mut state = ScanState::new();
            self.scan_into(roots, &mut state)?;
            Ok(state)
        }

        fn scan_into(&self, roots: &[&str], state: &mut ScanState) -> BumResult<()> {
            let codec = JsonCodec::new();
            let scanner = ReferenceScanner::new(
                &self.overlay,
                &self.unifier,
                &codec,
                &self.hashtables,
                &self.settings,
            );
            let roots: Vec<UnifiedKey> = roots.iter().map(|r| self.unifier.unify(r)).collect();
            scanner.scan(&roots, state)
        }
    }

    #[test]
    fn test_records_references_with_existence() {
        let fixture = Fixture::new(|root| {
            write_asset(root, "assets/present.dds");
            write_container(
                root,
                "data/root.bin",
                &Container::new(
                    Vec::new(),
                    vec![Record::new(
                        RecordKey(1),
                        10,
                        vec![
                            Field::new(1, FieldTree::string("ASSETS/Present.dds")),
                            Field::new(2, FieldTree::string("assets/absent.dds")),
                            Field::new(3, FieldTree::string("not a path")),
                        ],
                    )],
                ),
            );
        });

        let state = fixture.scan(&["data/root.bin"]).unwrap();
        let record = state.record(RecordKey(1)).unwrap();
        assert_eq!(record.references.len(), 2);
        assert_eq!(record.prefix, "bum");

        let present = &record.references[&fixture.unifier.unify("assets/present.dds")];
        assert!(present.exists);
        assert_eq!(present.raw, "ASSETS/Present.dds");

        let absent = &record.references[&fixture.unifier.unify("assets/absent.dds")];
        assert!(!absent.exists);
    }

    #[test]
    fn test_second_reference_to_same_key_wins() {
        let fixture = Fixture::new(|root| {
            write_container(
                root,
                "data/root.bin",
                &Container::new(
                    Vec::new(),
                    vec![Record::new(
                        RecordKey(1),
                        10,
                        vec![
                            Field::new(1, FieldTree::string("assets/dup.dds")),
                            Field::new(2, FieldTree::string("ASSETS\\DUP.dds")),
                        ],
                    )],
                ),
            );
        });

        let state = fixture.scan(&["data/root.bin"]).unwrap();
        let record = state.record(RecordKey(1)).unwrap();
        assert_eq!(record.references.len(), 1);
        let reference = record.references.values().next().unwrap();
        assert_eq!(reference.raw, "ASSETS\\DUP.dds");
    }

    #[test]
    fn test_follows_links_once_and_builds_graph() {
        let fixture = Fixture::new(|root| {
            write_container(
                root,
                "data/root.bin",
                &Container::new(
                    vec![
                        "data/a.bin".to_string(),
                        "data/b.bin".to_string(),
                        "data/gone.bin".to_string(),
                    ],
                    vec![Record::new(RecordKey(1), 10, Vec::new())],
                ),
            );
            write_container(
                root,
                "data/a.bin",
                &Container::new(
                    vec!["data/shared.bin".to_string()],
                    vec![Record::new(RecordKey(2), 10, Vec::new())],
                ),
            );
            write_container(
                root,
                "data/b.bin",
                &Container::new(
                    vec!["data/shared.bin".to_string(), "data/root.bin".to_string()],
                    vec![Record::new(RecordKey(3), 10, Vec::new())],
                ),
            );
            write_container(
                root,
                "data/shared.bin",
                &Container::new(Vec::new(), vec![Record::new(RecordKey(4), 10, Vec::new())]),
            );
        });

        let state = fixture.scan(&["data/root.bin"]).unwrap();
        let u = |p: &str| fixture.unifier.unify(p);

        assert_eq!(state.record_count(), 4);
        assert_eq!(
            state.link_graph().links(&u("data/root.bin")),
            &[u("data/a.bin"), u("data/b.bin")]
        );
        assert_eq!(
            state.link_graph().links(&u("data/b.bin")),
            &[u("data/shared.bin"), u("data/root.bin")]
        );
        assert!(!state.all_containers()[&u("data/gone.bin")].exists);
        assert!(state.all_containers()[&u("data/shared.bin")].exists);
        assert!(state.all_containers()[&u("data/root.bin")].exists);
        assert_eq!(state.roots(), &[u("data/root.bin")]);
        assert_eq!(state.record(RecordKey(4)).unwrap().container, u("data/shared.bin"));
    }

    #[test]
    fn test_self_skin_link_not_followed_or_recorded() {
        let fixture = Fixture::new(|root| {
            write_container(
                root,
                "data/characters/ahri/skins/skin1.bin",
                &Container::new(
                    vec!["data/characters/ahri/ahri.bin".to_string()],
                    vec![Record::new(RecordKey(1), 10, Vec::new())],
                ),
            );
            write_container(
                root,
                "data/characters/ahri/ahri.bin",
                &Container::new(Vec::new(), vec![Record::new(RecordKey(2), 10, Vec::new())]),
            );
        });

        let state = fixture.scan(&["data/characters/ahri/skins/skin1.bin"]).unwrap();
        let ahri = fixture.unifier.unify("data/characters/ahri/ahri.bin");
        assert!(!state.all_containers().contains_key(&ahri));
        assert!(!state.is_scanned(&ahri));
        assert!(state.record(RecordKey(2)).is_none());
    }

    #[test]
    fn test_decode_failure_stops_scan() {
        let fixture = Fixture::new(|root| {
            write_asset(root, "data/broken.bin");
        });

        let err = fixture.scan(&["data/broken.bin"]).unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
    }

    #[test]
    fn test_rescan_reports_broken_link_again() {
        let fixture = Fixture::new(|root| {
            write_container(
                root,
                "data/root.bin",
                &Container::new(vec!["data/bad.bin".to_string()], Vec::new()),
            );
            write_asset(root, "data/bad.bin");
        });

        let mut state = ScanState::new();
        let first = fixture.scan_into(&["data/root.bin"], &mut state).unwrap_err();
        assert_eq!(first.kind(), "DecodeError");
        assert!(state.scanned.is_empty());

        let second = fixture.scan_into(&["data/root.bin"], &mut state).unwrap_err();
        assert_eq!(second.kind(), "DecodeError");
    }

    #[test]
    fn test_unknown_root_is_missing_container() {
        let fixture = Fixture::new(|root| write_asset(root, "assets/x.dds"));
        let err = fixture.scan(&["data/nope.bin"]).unwrap_err();
        assert!(matches!(err, BumError::MissingContainer { .. }));
    }

    #[test]
    fn test_names_resolved_from_hash_tables() {
        let mut fixture = Fixture::new(|root| {
            write_container(
                root,
                "data/root.bin",
                &Container::new(
                    Vec::new(),
                    vec![
                        Record::new(RecordKey::from_name("Characters/Ahri/Skins/Skin1"), 77, Vec::new()),
                        Record::new(RecordKey(5), 78, Vec::new()),
                    ],
                ),
            );
        });
        fixture.hashtables.insert_entry("Characters/Ahri/Skins/Skin1");
        fixture.hashtables.insert_type(77, "SkinCharacterDataProperties");

        let state = fixture.scan(&["data/root.bin"]).unwrap();
        let named = state
            .record(RecordKey::from_name("characters/ahri/skins/skin1"))
            .unwrap();
        assert_eq!(named.name.as_deref(), Some("Characters/Ahri/Skins/Skin1"));
        assert_eq!(named.type_name.as_deref(), Some("SkinCharacterDataProperties"));

        let unnamed = state.record(RecordKey(5)).unwrap();
        assert_eq!(unnamed.name, None);
        assert_eq!(unnamed.display_name(), "00000005");
    }

    proptest! {
        #[test]
        fn prop_self_skin_detected_for_any_name(name in "[a-z][a-z0-9_]{0,15}") {
            let link = format!("data/characters/{}/{}.bin", name, name);
            prop_assert!(is_self_skin_link(&link));
            let nested = format!("DATA/Characters/{}/{}/extra.bin", name, name);
            prop_assert!(is_self_skin_link(&nested));
        }

        #[test]
        fn prop_skin_containers_are_not_self_skin(name in "[a-z][a-z0-9_]{0,15}", n in 0u32..100) {
            let link = format!("data/characters/{}/skins/skin{}.bin", name, n);
            prop_assume!(name != "skins");
            prop_assert!(!is_self_skin_link(&link));
        }
    }
}
