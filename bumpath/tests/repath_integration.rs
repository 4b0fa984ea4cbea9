//! Integration tests for the repathing pipeline.
//!
//! These tests drive [`BumpathEngine`] through scan, rewrite and merge
//! against real directories:
//! - two-directory package with a linked container, merged into its root
//! - missing-reference gate with and without `ignore_missing`
//! - overlay priority between source directories
//! - self-skin links and long file names
//!
//! Run with: `cargo test --test repath_integration`

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use bumpath::codec::{ContainerCodec, JsonCodec};
use bumpath::record::{Container, Field, FieldTree, Record, RecordKey};
use bumpath::settings::EngineSettings;
use bumpath::unify::{PathUnifier, Xxh64PathHasher};
use bumpath::{BumError, BumOptions, BumpathEngine};

// ============================================================================
// Helper Functions
// ============================================================================

fn write_container(root: &Path, relative: &str, container: &Container) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    JsonCodec::new().encode(container, &path).unwrap();
}

fn write_asset(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn record(key: u32, paths: &[&str]) -> Record {
    let fields = paths
        .iter()
        .enumerate()
        .map(|(i, p)| Field::new(i as u32, FieldTree::string(*p)))
        .collect();
    Record::new(RecordKey(key), 0xc1a55, fields)
}

fn engine() -> BumpathEngine {
    BumpathEngine::new(Box::new(JsonCodec::new()), EngineSettings::default())
}

fn path_strings(record: &Record) -> Vec<String> {
    let mut strings = Vec::new();
    record
        .tree
        .for_each_path_string(&mut |s| strings.push(s.to_string()));
    strings
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A root in one directory links to a shared container in another; merging
/// leaves one root file holding every record once.
#[test]
fn test_end_to_end_combine_linked() {
    let temp = TempDir::new().unwrap();
    let dir_a = temp.path().join("a");
    let dir_b = temp.path().join("b");
    let out = temp.path().join("out");

    write_container(
        &dir_a,
        "data/root.bin",
        &Container::new(
            vec!["data/shared.bin".to_string()],
            vec![record(1, &["assets/root/a.dds"]), record(2, &[])],
        ),
    );
    write_asset(&dir_a, "assets/root/a.dds", b"root");
    write_container(
        &dir_b,
        "data/shared.bin",
        &Container::new(
            Vec::new(),
            vec![record(3, &["ASSETS/Shared/B.dds"]), record(2, &[])],
        ),
    );
    write_asset(&dir_b, "assets/shared/b.dds", b"shared");

    let mut engine = engine();
    engine.add_directories(&[&dir_a, &dir_b]).unwrap();
    assert!(engine.select("data/root.bin", true));

    let scan = engine.scan().unwrap();
    assert_eq!(scan.records.len(), 3);
    assert_eq!(scan.missing_count(), 0);

    let report = engine
        .bum(&BumOptions::new(&out).combine_linked(true))
        .unwrap();

    assert_eq!(report.merged.len(), 1);
    assert_eq!(report.merged[0].absorbed, 1);
    assert!(!out.join("data/shared.bin").exists());
    assert_eq!(fs::read(out.join("assets/bum/root/a.dds")).unwrap(), b"root");
    assert_eq!(
        fs::read(out.join("assets/bum/shared/b.dds")).unwrap(),
        b"shared"
    );

    let merged = JsonCodec::new().decode(&out.join("data/root.bin")).unwrap();
    let keys: Vec<u32> = merged.records.iter().map(|r| r.key.0).collect();
    assert_eq!(keys, vec![1, 2, 3]);
    assert!(merged.links.is_empty());
    assert_eq!(path_strings(&merged.records[0]), vec!["assets/bum/root/a.dds"]);
    assert_eq!(path_strings(&merged.records[2]), vec!["ASSETS/bum/Shared/B.dds"]);

    let unifier = PathUnifier::default();
    assert!(report
        .outputs
        .contains_key(unifier.unify("data/root.bin").as_str()));
    assert!(!report
        .outputs
        .contains_key(unifier.unify("data/shared.bin").as_str()));
}

/// Two selected roots linking the same container both receive its records.
#[test]
fn test_roots_sharing_a_linked_container_both_absorb_it() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let out = temp.path().join("out");

    for (name, key) in [("r1", 1), ("r2", 2)] {
        write_container(
            &src,
            &format!("data/{}.bin", name),
            &Container::new(vec!["data/shared.bin".to_string()], vec![record(key, &[])]),
        );
    }
    write_container(
        &src,
        "data/shared.bin",
        &Container::new(Vec::new(), vec![record(3, &[])]),
    );

    let mut engine = engine();
    engine.add_directories(&[&src]).unwrap();
    assert!(engine.select("data/r1.bin", true));
    assert!(engine.select("data/r2.bin", true));
    engine.scan().unwrap();

    let report = engine
        .bum(&BumOptions::new(&out).combine_linked(true))
        .unwrap();

    assert_eq!(report.merged.len(), 2);
    assert!(!out.join("data/shared.bin").exists());
    for (name, expected) in [("r1", vec![1, 3]), ("r2", vec![2, 3])] {
        let merged = JsonCodec::new()
            .decode(&out.join(format!("data/{}.bin", name)))
            .unwrap();
        let keys: Vec<u32> = merged.records.iter().map(|r| r.key.0).collect();
        assert_eq!(keys, expected, "records of {}", name);
        assert!(merged.links.is_empty());
    }
}

/// Without `ignore_missing` an absent reference stops the rewrite; with it
/// the reference is skipped and left untouched.
#[test]
fn test_missing_reference_gate() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    write_container(
        &src,
        "data/skin.bin",
        &Container::new(
            Vec::new(),
            vec![record(1, &["assets/here.dds", "assets/gone.dds"])],
        ),
    );
    write_asset(&src, "assets/here.dds", b"x");

    let mut engine = engine();
    engine.add_directories(&[&src]).unwrap();
    engine.select_all();
    engine.scan().unwrap();

    let err = engine
        .bum(&BumOptions::new(temp.path().join("strict")))
        .unwrap_err();
    match &err {
        BumError::MissingReference { path, .. } => assert_eq!(path, "assets/gone.dds"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_pair().0, "MissingReference");

    let lenient = temp.path().join("lenient");
    let report = engine
        .bum(&BumOptions::new(&lenient).ignore_missing(true))
        .unwrap();
    assert_eq!(report.skipped_missing, 1);
    assert!(lenient.join("assets/bum/here.dds").exists());
    assert!(!lenient.join("assets/bum/gone.dds").exists());

    let skin = JsonCodec::new()
        .decode(&lenient.join("data/skin.bin"))
        .unwrap();
    assert_eq!(
        path_strings(&skin.records[0]),
        vec!["assets/bum/here.dds", "assets/gone.dds"]
    );
}

/// The first directory listed provides a file present in several directories.
#[test]
fn test_overlay_priority_follows_call_order() {
    let temp = TempDir::new().unwrap();
    let dir_a = temp.path().join("a");
    let dir_b = temp.path().join("b");
    for (dir, contents) in [(&dir_a, b"from a"), (&dir_b, b"from b")] {
        write_container(
            dir,
            "data/skin.bin",
            &Container::new(Vec::new(), vec![record(1, &["assets/x.dds"])]),
        );
        write_asset(dir, "assets/x.dds", contents);
    }

    for (order, expected) in [([&dir_a, &dir_b], b"from a"), ([&dir_b, &dir_a], b"from b")] {
        let out = temp.path().join("out");
        let _ = fs::remove_dir_all(&out);

        let mut engine = engine();
        engine.add_directories(&order).unwrap();
        engine.select_all();
        engine.scan().unwrap();
        engine.bum(&BumOptions::new(&out)).unwrap();

        assert_eq!(fs::read(out.join("assets/bum/x.dds")).unwrap(), expected);
    }
}

/// A character container linking to its own base container does not follow
/// or record the link.
#[test]
fn test_self_skin_link_is_skipped() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    write_container(
        &src,
        "data/characters/ahri/skins/skin1.bin",
        &Container::new(
            vec![
                "DATA/Characters/Ahri/Ahri.bin".to_string(),
                "data/shared/common.bin".to_string(),
            ],
            vec![record(1, &[])],
        ),
    );
    write_container(
        &src,
        "data/characters/ahri/ahri.bin",
        &Container::new(Vec::new(), vec![record(2, &[])]),
    );
    write_container(
        &src,
        "data/shared/common.bin",
        &Container::new(Vec::new(), vec![record(3, &[])]),
    );

    let mut engine = engine();
    engine.add_directories(&[&src]).unwrap();
    engine
        .select_matching("data/characters/*/skins/*.bin")
        .unwrap();
    let report = engine.scan().unwrap();

    let raws: Vec<&str> = report.containers.iter().map(|c| c.raw.as_str()).collect();
    assert!(raws.contains(&"data/shared/common.bin"));
    assert!(!raws.iter().any(|r| r.to_lowercase().ends_with("ahri/ahri.bin")));

    let keys: Vec<&str> = report.records.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["00000001", "00000003"]);
}

/// A prefixed file name longer than the limit is written under its hash.
#[test]
fn test_long_file_name_written_under_hash() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let unifier = PathUnifier::new(Xxh64PathHasher);

    let long_reference = format!("assets/{}.dds", "n".repeat(300));
    let stored_name = format!("{}.dds", unifier.hash_token(&long_reference).unwrap());

    write_container(
        &src,
        "data/skin.bin",
        &Container::new(Vec::new(), vec![record(1, &[long_reference.as_str()])]),
    );
    write_asset(&src, &stored_name, b"long");

    let mut engine = engine();
    engine.add_directories(&[&src]).unwrap();
    engine.select_all();
    let scan = engine.scan().unwrap();
    assert_eq!(scan.missing_count(), 0);

    let out = temp.path().join("out");
    engine.bum(&BumOptions::new(&out)).unwrap();

    let prefixed = format!("assets/bum/{}.dds", "n".repeat(300));
    let expected = out.join(format!("{}.dds", unifier.hash_token(&prefixed).unwrap()));
    assert_eq!(fs::read(expected).unwrap(), b"long");
}
