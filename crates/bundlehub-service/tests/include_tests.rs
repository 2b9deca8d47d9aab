//! Inclusion engine tests against a real temp directory and an
//! in-memory database.

use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use bundlehub_core::error::ErrorKind;
use bundlehub_database::{FilterParams, Store, connection};
use bundlehub_entity::BundleRequest;
use bundlehub_service::InclusionEngine;
use bundlehub_storage::DataRoot;

struct Harness {
    store: Store,
    root: DataRoot,
    sources: PathBuf,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let sources = dir.path().join("sources");
    std::fs::create_dir_all(&sources).unwrap();
    let root = DataRoot::new(dir.path().join("root").to_str().unwrap())
        .await
        .unwrap();
    Harness {
        store: Store::new(connection::memory_pool().await.unwrap()),
        root,
        sources,
        _dir: dir,
    }
}

impl Harness {
    fn source(&self, name: &str, content: &[u8]) -> String {
        let path = self.sources.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn engine(&self) -> InclusionEngine {
        InclusionEngine::new(self.store.clone(), self.root.clone())
    }
}

#[tokio::test]
async fn test_include_links_and_rewrites_paths() {
    let h = harness().await;
    let a = h.source("a.vcf", b"variants");
    let b = h.source("b.cram", b"reads");

    let request: BundleRequest = serde_json::from_value(serde_json::json!({
        "name": "case42",
        "created": "2024-01-01T12:00:00Z",
        "files": [{"path": [a, b], "tags": ["sample"]}],
    }))
    .unwrap();
    let (_, version) = h.store.add_bundle(&request).await.unwrap().unwrap();

    let included = h.engine().include_version(version.id).await.unwrap();
    assert!(included.included_at.is_some());
    // The version keeps its original registration timestamp.
    assert_eq!(included.created_at, version.created_at);

    let files = h
        .store
        .get_files(&FilterParams {
            version_id: Some(version.id),
            ..Default::default()
        })
        .await
        .unwrap();
    for file in &files {
        // Stored paths are now root-relative, under the version date.
        assert!(!file.path.starts_with('/'), "path not rewritten: {}", file.path);
        assert!(file.path.starts_with("case42/2024-01-01/"));

        // Link, not copy: same inode as the original source.
        let linked = std::fs::metadata(file.full_path(h.root.path())).unwrap();
        let original = std::fs::metadata(
            h.sources.join(file.path.rsplit('/').next().unwrap()),
        )
        .unwrap();
        assert_eq!(linked.ino(), original.ino());
        assert_eq!(linked.nlink(), 2);
    }
}

#[tokio::test]
async fn test_include_happens_at_most_once() {
    let h = harness().await;
    let a = h.source("a.vcf", b"x");
    let request: BundleRequest = serde_json::from_value(serde_json::json!({
        "name": "case42",
        "created": "2024-01-01T12:00:00Z",
        "files": [{"path": a}],
    }))
    .unwrap();
    let (_, version) = h.store.add_bundle(&request).await.unwrap().unwrap();

    let first = h.engine().include_version(version.id).await.unwrap();
    let err = h.engine().include_version(version.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyIncluded);
    // The message carries the original inclusion timestamp.
    assert!(
        err.message
            .contains(&first.included_at.unwrap().to_string())
    );
}

#[tokio::test]
async fn test_colliding_base_names_are_rejected_up_front() {
    let h = harness().await;
    let a = h.source("x/sample.vcf", b"one");
    let b = h.source("y/sample.vcf", b"two");
    let request: BundleRequest = serde_json::from_value(serde_json::json!({
        "name": "case42",
        "created": "2024-01-01T12:00:00Z",
        "files": [{"path": [a, b]}],
    }))
    .unwrap();
    let (_, version) = h.store.add_bundle(&request).await.unwrap().unwrap();

    let err = h.engine().include_version(version.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // Nothing was linked and the version is still includable.
    assert!(!h.root.path().join("case42").exists());
    let version = h.store.get_version_by_id(version.id).await.unwrap().unwrap();
    assert!(version.included_at.is_none());
}

#[tokio::test]
async fn test_include_unknown_version() {
    let h = harness().await;
    let err = h.engine().include_version(404).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
