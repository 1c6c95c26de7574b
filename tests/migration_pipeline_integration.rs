use std::collections::BTreeSet;
use std::path::PathBuf;

use xrdsync::ReplicateError;
use xrdsync::replicate::check::{CheckDecision, ConsistencyChecker};
use xrdsync::replicate::enumeration::enumerate_source_tree;
use xrdsync::replicate::resolve::MigrationResolver;
use xrdsync::tool::RemoteTool;

/// Local filesystem stats pass through; every remote object is absent.
struct LocalOnlyTool;

impl RemoteTool for LocalOnlyTool {
    fn copy(&self, _s: &str, _d: &str) -> Result<(), ReplicateError> {
        unreachable!("planning phase must not copy")
    }
    fn checksum(&self, _t: &str) -> Result<String, ReplicateError> {
        unreachable!("planning phase must not checksum")
    }
    fn remove(&self, _t: &str) -> Result<(), ReplicateError> {
        unreachable!("planning phase must not remove")
    }
    fn refresh_cache(&self, _d: &str) -> Result<(), ReplicateError> {
        unreachable!("planning phase must not refresh")
    }
    fn stat_size(&self, target: &str) -> Result<Option<u64>, ReplicateError> {
        if target.contains("://") {
            return Ok(None);
        }
        match std::fs::metadata(target) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            _ => Ok(None),
        }
    }
    fn list_dir(&self, _u: &str) -> Result<Vec<String>, ReplicateError> {
        Ok(Vec::new())
    }
}

const DEST_ROOT: &str = "root://cms-xrdr.private.lo:2094//xrd/store/user/alice";

fn scratch_tree(tag: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("xrdsync_mig_{}_{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(root.join("alice/analysis/2026")).expect("mkdir");
    std::fs::write(root.join("alice/analysis/ntuple_1.root"), b"aaaa").expect("write");
    std::fs::write(root.join("alice/analysis/2026/ntuple_2.root"), b"bbbbbb").expect("write");
    root
}

#[test]
fn enumerated_tree_maps_to_destination_uris() {
    let root = scratch_tree("map");
    let sources = enumerate_source_tree(&root.join("alice"));
    assert_eq!(sources.len(), 2);

    let resolver =
        MigrationResolver::new("alice".to_string(), vec![root.clone()], DEST_ROOT, None);
    let tool = LocalOnlyTool;
    let checker = ConsistencyChecker::new(&tool, false, false);

    let mut dests = Vec::new();
    let mut refresh_dirs = BTreeSet::new();
    for src in &sources {
        let resolved = resolver.resolve(src).expect("resolve");
        // Sentinel size: migration always retransfers.
        let decision = checker.decide(&resolved.source, &resolved.source, &resolved.dest, -1);
        assert_eq!(decision, CheckDecision::Transfer { stale_dest: false });
        dests.push(resolved.dest);
        refresh_dirs.insert(resolved.refresh_dir);
    }
    dests.sort();
    assert_eq!(
        dests,
        vec![
            format!("{}/analysis/2026/ntuple_2.root", DEST_ROOT),
            format!("{}/analysis/ntuple_1.root", DEST_ROOT),
        ]
    );
    // One refresh per affected destination directory, deduplicated.
    assert_eq!(
        refresh_dirs.into_iter().collect::<Vec<_>>(),
        vec![format!("{}/analysis", DEST_ROOT), format!("{}/analysis/2026", DEST_ROOT)]
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn vanished_source_is_excluded_not_failed() {
    let root = scratch_tree("gone");
    let resolver =
        MigrationResolver::new("alice".to_string(), vec![root.clone()], DEST_ROOT, None);
    let resolved = resolver
        .resolve(&root.join("alice/analysis/deleted_meanwhile.root"))
        .expect("resolve");

    let tool = LocalOnlyTool;
    let checker = ConsistencyChecker::new(&tool, false, false);
    let decision = checker.decide(&resolved.source, &resolved.source, &resolved.dest, -1);
    assert_eq!(decision, CheckDecision::Exclude);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn prepend_groups_all_destinations_under_one_subtree() {
    let root = scratch_tree("prepend");
    let resolver = MigrationResolver::new(
        "alice".to_string(),
        vec![root.clone()],
        DEST_ROOT,
        Some("backup_2026-08"),
    );
    let resolved =
        resolver.resolve(&root.join("alice/analysis/ntuple_1.root")).expect("resolve");
    assert_eq!(
        resolved.dest,
        format!("{}/backup_2026-08/analysis/ntuple_1.root", DEST_ROOT)
    );
    let _ = std::fs::remove_dir_all(&root);
}
