//! Behavioural properties of the snapshot hierarchy

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use vfs_core::hash::{dir_signature, hash_bytes, IncrementalHasher};
use vfs_core::path::{file_name, CaseSensitivity};
use vfs_core::{
    AccessType, EmptyDirectoryHandling, FileMetadata, FileSystemLocationSnapshot,
    MerkleDirectorySnapshotBuilder, MetadataSnapshot, SnapshotKind,
};
use vfs_hierarchy::{NoopDiffListener, SnapshotCollectingDiffListener, SnapshotHierarchy};

fn file(path: &str, content: &[u8]) -> FileSystemLocationSnapshot {
    FileSystemLocationSnapshot::regular_file(
        path,
        file_name(path),
        hash_bytes(content),
        FileMetadata::file(1, content.len() as u64, AccessType::Direct),
    )
}

fn missing(path: &str) -> FileSystemLocationSnapshot {
    FileSystemLocationSnapshot::missing_at(path)
}

fn sensitive() -> SnapshotHierarchy {
    SnapshotHierarchy::new(CaseSensitivity::CaseSensitive)
}

/// `/root` with `f1` ("hi") and `sub/f2` ("yo")
fn sample_tree() -> FileSystemLocationSnapshot {
    let mut builder = MerkleDirectorySnapshotBuilder::sorting_required();
    let include = EmptyDirectoryHandling::IncludeEmptyDirs;
    builder.enter_directory(AccessType::Direct, "/root", "root", include);
    builder.enter_directory(AccessType::Direct, "/root/sub", "sub", include);
    builder.visit_leaf_element(file("/root/sub/f2", b"yo"));
    builder.leave_directory().unwrap();
    builder.visit_leaf_element(file("/root/f1", b"hi"));
    builder.leave_directory().unwrap();
    builder.into_result().unwrap().unwrap()
}

#[test]
fn test_store_is_idempotent() {
    let snapshot = file("/a/b/c", b"content");
    let once = sensitive().store("/a/b/c", snapshot.clone(), &mut NoopDiffListener);

    let mut listener = SnapshotCollectingDiffListener::new();
    let twice = once.store("/a/b/c", snapshot.clone(), &mut listener);

    assert!(once.ptr_eq(&twice));
    assert!(listener.is_empty());
    assert_eq!(twice.find_snapshot("/a/b/c"), Some(snapshot));
}

#[test]
fn test_invalidate_then_lookup_is_empty() {
    let tree = sample_tree();
    let hierarchies = [
        sensitive(),
        sensitive().store("/other", file("/other", b"o"), &mut NoopDiffListener),
        sensitive().store("/root/sub/extra", missing("/root/sub/extra"), &mut NoopDiffListener),
    ];

    for base in hierarchies {
        for path in ["/root", "/root/f1", "/root/sub", "/root/sub/f2"] {
            let stored = base.store("/root", tree.clone(), &mut NoopDiffListener);
            let invalidated = stored.invalidate(path, &mut NoopDiffListener);

            assert!(invalidated.find_metadata(path).is_none(), "{path} still known");
            assert!(invalidated.find_metadata(&format!("{path}/below")).is_none());
        }
    }
}

#[test]
fn test_directory_hash_is_order_independent() {
    let names: Vec<String> = (0..20).map(|i| format!("n{i}")).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let reference = FileSystemLocationSnapshot::directory(
        "/d",
        "d",
        AccessType::Direct,
        names.iter().map(|n| file(&format!("/d/{n}"), n.as_bytes())).collect(),
    );
    for _ in 0..10 {
        let mut shuffled = names.clone();
        shuffled.shuffle(&mut rng);
        let directory = FileSystemLocationSnapshot::directory(
            "/d",
            "d",
            AccessType::Direct,
            shuffled.iter().map(|n| file(&format!("/d/{n}"), n.as_bytes())).collect(),
        );
        assert_eq!(directory.hash(), reference.hash());
    }
}

#[test]
fn test_sibling_split_and_merge() {
    let x = file("/a/b/x", b"x");
    let y = file("/a/b/y", b"y");
    let h = sensitive()
        .store("/a/b/x", x.clone(), &mut NoopDiffListener)
        .store("/a/b/y", y.clone(), &mut NoopDiffListener);

    // split point is known to be a directory because its children exist
    assert_eq!(
        h.find_metadata("/a/b"),
        Some(MetadataSnapshot::Directory(AccessType::Direct))
    );

    let h = h.invalidate("/a/b/x", &mut NoopDiffListener);
    assert!(h.find_metadata("/a/b/x").is_none());
    assert_eq!(h.find_snapshot("/a/b/y").unwrap().hash(), y.hash());
}

#[test]
fn test_unknown_split_point_collapses_after_invalidate() {
    let h = sensitive()
        .store("/a/b/x", missing("/a/b/x"), &mut NoopDiffListener)
        .store("/a/b/y", missing("/a/b/y"), &mut NoopDiffListener);
    assert!(h.find_metadata("/a/b").is_none());

    let h = h.invalidate("/a/b/x", &mut NoopDiffListener);
    let children = h.root_node().children().unwrap();
    let keys: Vec<&str> = children.iter().map(|(key, _)| &**key).collect();
    assert_eq!(keys, vec![format!("a/b{}y", std::path::MAIN_SEPARATOR)]);
    assert_eq!(h.find_snapshot("/a/b/y").unwrap().kind(), SnapshotKind::Missing);
}

#[test]
fn test_old_versions_are_unaffected() {
    let h1 = sensitive().store("/a/x", file("/a/x", b"1"), &mut NoopDiffListener);
    let before = h1.find_metadata("/a/y");

    let h2 = h1.store("/a/y", file("/a/y", b"2"), &mut NoopDiffListener);
    let h3 = h2.invalidate("/a/x", &mut NoopDiffListener);

    assert_eq!(h1.find_metadata("/a/y"), before);
    assert!(h1.find_snapshot("/a/x").is_some());
    assert!(h2.find_snapshot("/a/x").is_some());
    assert!(h2.find_snapshot("/a/y").is_some());
    assert!(h3.find_snapshot("/a/x").is_none());
}

#[test]
fn test_case_sensitivity() {
    let snapshot = file("/A/B", b"ab");

    let insensitive = SnapshotHierarchy::new(CaseSensitivity::CaseInsensitive)
        .store("/A/B", snapshot.clone(), &mut NoopDiffListener);
    assert_eq!(insensitive.find_snapshot("/a/b"), Some(snapshot.clone()));
    // original case is kept for display
    assert_eq!(insensitive.root_snapshots()[0].absolute_path(), "/A/B");

    let sensitive = sensitive().store("/A/B", snapshot, &mut NoopDiffListener);
    assert!(sensitive.find_metadata("/a/b").is_none());
}

#[test]
fn test_case_insensitive_lookup_inside_directory_snapshot() {
    let tree = FileSystemLocationSnapshot::directory(
        "/Proj",
        "Proj",
        AccessType::Direct,
        vec![file("/Proj/ReadMe.md", b"r")],
    );
    let h = SnapshotHierarchy::new(CaseSensitivity::CaseInsensitive)
        .store("/Proj", tree, &mut NoopDiffListener);
    assert_eq!(
        h.find_snapshot("/proj/readme.md").unwrap().kind(),
        SnapshotKind::RegularFile
    );
}

#[test]
fn test_case_insensitive_invalidate_next_to_case_variants() {
    let tree = FileSystemLocationSnapshot::directory(
        "/d",
        "d",
        AccessType::Direct,
        vec![
            file("/d/README", b"upper"),
            file("/d/readme", b"lower"),
            file("/d/other", b"other"),
        ],
    );
    let h = SnapshotHierarchy::new(CaseSensitivity::CaseInsensitive)
        .store("/d", tree, &mut NoopDiffListener);

    let invalidated = h.invalidate("/d/other", &mut NoopDiffListener);

    assert!(invalidated.find_metadata("/d/other").is_none());
    assert!(matches!(
        invalidated.find_metadata("/d"),
        Some(MetadataSnapshot::Directory(AccessType::Direct))
    ));
    let kept = invalidated.find_snapshot("/d/readme").unwrap();
    assert_eq!(kept.absolute_path(), "/d/README");
    assert_eq!(invalidated.root_snapshots().len(), 1);
}

#[test]
fn test_sample_tree_hash_and_invalidation() {
    let tree = sample_tree();

    let mut sub = IncrementalHasher::new();
    sub.put_hash(&dir_signature());
    sub.put_string("f2");
    sub.put_hash(&hash_bytes(b"yo"));
    let sub_hash = sub.finalize();

    let mut root = IncrementalHasher::new();
    root.put_hash(&dir_signature());
    root.put_string("f1");
    root.put_hash(&hash_bytes(b"hi"));
    root.put_string("sub");
    root.put_hash(&sub_hash);
    assert_eq!(tree.hash(), root.finalize());

    let h = sensitive().store("/root", tree.clone(), &mut NoopDiffListener);
    let mut listener = SnapshotCollectingDiffListener::new();
    let h = h.invalidate("/root/sub/f2", &mut listener);

    assert_eq!(
        h.find_metadata("/root/sub"),
        Some(MetadataSnapshot::Directory(AccessType::Direct))
    );
    assert_eq!(
        h.find_metadata("/root"),
        Some(MetadataSnapshot::Directory(AccessType::Direct))
    );
    assert!(h.find_metadata("/root/sub/f2").is_none());
    assert_eq!(h.find_snapshot("/root/f1"), Some(file("/root/f1", b"hi")));

    let removed: Vec<&str> = listener.removed().iter().map(|s| s.absolute_path()).collect();
    let added: Vec<&str> = listener.added().iter().map(|s| s.absolute_path()).collect();
    assert_eq!(removed, vec!["/root"]);
    assert_eq!(added, vec!["/root/f1"]);
}

#[test]
fn test_missing_inside_complete_directory() {
    let h = sensitive().store("/root", sample_tree(), &mut NoopDiffListener);
    let missing = h.find_snapshot("/root/nope").unwrap();
    assert_eq!(missing.kind(), SnapshotKind::Missing);
    assert_eq!(missing.absolute_path(), "/root/nope");

    // below a regular file nothing can exist
    assert_eq!(
        h.find_snapshot("/root/f1/child").unwrap().kind(),
        SnapshotKind::Missing
    );
}

#[test]
fn test_store_inside_complete_directory_is_absorbed() {
    let h = sensitive().store("/root", sample_tree(), &mut NoopDiffListener);
    let mut listener = SnapshotCollectingDiffListener::new();
    let same = h.store("/root/new", file("/root/new", b"n"), &mut listener);
    assert!(h.ptr_eq(&same));
    assert!(listener.is_empty());
}

#[test]
fn test_complete_ancestor_replaces_descendants() {
    let h = sensitive()
        .store("/root/f1", file("/root/f1", b"old"), &mut NoopDiffListener)
        .store("/root/other", file("/root/other", b"o"), &mut NoopDiffListener);

    let mut listener = SnapshotCollectingDiffListener::new();
    let h = h.store("/root", sample_tree(), &mut listener);

    assert_eq!(h.root_snapshots().len(), 1);
    assert_eq!(h.find_snapshot("/root/f1").unwrap().hash(), hash_bytes(b"hi"));
    assert_eq!(listener.removed().len(), 2);
    assert_eq!(listener.added().len(), 1);
}

#[test]
fn test_many_children_use_binary_search() {
    let mut h = sensitive();
    let mut paths: Vec<String> = (0..64).map(|i| format!("/top{i}/leaf")).collect();
    paths.shuffle(&mut ChaCha8Rng::seed_from_u64(3));
    for path in &paths {
        h = h.store(path, file(path, path.as_bytes()), &mut NoopDiffListener);
    }

    assert_eq!(h.root_node().children().unwrap().len(), 64);
    for path in &paths {
        assert_eq!(h.find_snapshot(path).unwrap().hash(), hash_bytes(path.as_bytes()));
    }

    for path in paths.iter().step_by(2) {
        h = h.invalidate(path, &mut NoopDiffListener);
    }
    assert_eq!(h.root_snapshots().len(), 32);
}
