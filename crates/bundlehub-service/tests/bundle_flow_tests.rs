//! End-to-end bundle workflows: registration guards, disk partitioning,
//! deletion policy, and archive checksum round trips.

use std::path::PathBuf;

use bundlehub_core::error::ErrorKind;
use bundlehub_database::{FilterParams, Store, connection};
use bundlehub_entity::BundleRequest;
use bundlehub_service::{ArchiveService, BundleService, InclusionEngine};
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
        std::fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn bundles(&self) -> BundleService {
        BundleService::new(self.store.clone(), self.root.clone())
    }

    fn archives(&self) -> ArchiveService {
        ArchiveService::new(self.store.clone(), self.root.clone())
    }

    fn request(&self, name: &str, files: serde_json::Value) -> BundleRequest {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "created": "2024-01-01T12:00:00Z",
            "files": files,
        }))
        .unwrap()
    }
}

#[tokio::test]
async fn test_missing_source_rejects_whole_request() {
    let h = harness().await;
    let present = h.source("present.vcf", b"x");
    let absent = h.sources.join("absent.vcf");

    let request = h.request(
        "case42",
        serde_json::json!([
            {"path": present},
            {"path": absent.to_str().unwrap()},
        ]),
    );
    let err = h.bundles().add_bundle(&request).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingFile);

    // Nothing was persisted.
    assert!(h.store.get_bundle_by_name("case42").await.unwrap().is_none());
    assert!(
        h.store
            .get_files(&FilterParams::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_local_remote_partition() {
    let h = harness().await;
    let kept = h.source("kept.vcf", b"x");
    let removed = h.source("removed.vcf", b"y");
    let request = h.request(
        "case42",
        serde_json::json!([{"path": [kept.clone(), removed.clone()]}]),
    );
    h.bundles().add_bundle(&request).await.unwrap().unwrap();

    std::fs::remove_file(&removed).unwrap();

    let bundles = h.bundles();
    let local = bundles
        .get_files(&FilterParams::default(), true, false)
        .await
        .unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].path, kept);

    // The partition also works over a list fetched earlier, no re-query.
    let all = bundles
        .get_files(&FilterParams::default(), false, false)
        .await
        .unwrap();
    let remote = bundles.files_not_on_disk(&all);
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].path, removed);

    let err = bundles
        .get_files(&FilterParams::default(), true, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_files_not_on_disk_partitions_a_given_list() {
    let h = harness().await;
    let kept = h.source("kept.vcf", b"x");
    let gone = h.source("gone.vcf", b"y");
    let request = h.request(
        "case42",
        serde_json::json!([{"path": [kept.clone(), gone.clone()]}]),
    );
    h.bundles().add_bundle(&request).await.unwrap().unwrap();
    std::fs::remove_file(&gone).unwrap();

    let files = h.store.get_files(&FilterParams::default()).await.unwrap();
    let missing = h.bundles().files_not_on_disk(&files);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].path, gone);

    let empty: Vec<bundlehub_entity::BundleFile> = Vec::new();
    assert!(h.bundles().files_not_on_disk(&empty).is_empty());
}

#[tokio::test]
async fn test_add_version_rejects_invalid_request() {
    let h = harness().await;
    let path = h.source("a.vcf", b"x");
    let request = h.request("case42", serde_json::json!([{"path": path}]));
    h.bundles().add_bundle(&request).await.unwrap().unwrap();

    let bad: BundleRequest = serde_json::from_value(serde_json::json!({
        "name": "case42",
        "created": "2024-02-01T12:00:00Z",
        "files": [{"path": ""}],
    }))
    .unwrap();
    // An empty path is a shape problem, not a missing source file.
    let err = h.bundles().add_version("case42", &bad).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_archived_file_cannot_be_deleted() {
    let h = harness().await;
    let path = h.source("keep.cram", b"reads");
    let request = h.request("case42", serde_json::json!([{"path": path, "archive": true}]));
    h.bundles().add_bundle(&request).await.unwrap().unwrap();
    let file = &h.store.get_files(&FilterParams::default()).await.unwrap()[0];

    h.archives().submit_archiving(file.id, 7).await.unwrap();

    let err = h.bundles().delete_file(file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(h.store.get_file_by_id(file.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_included_file_removes_its_link() {
    let h = harness().await;
    let path = h.source("a.vcf", b"x");
    let request = h.request("case42", serde_json::json!([{"path": path.clone()}]));
    let (_, version) = h.bundles().add_bundle(&request).await.unwrap().unwrap();
    InclusionEngine::new(h.store.clone(), h.root.clone())
        .include_version(version.id)
        .await
        .unwrap();

    let file = h.store.get_files(&FilterParams::default()).await.unwrap()[0].clone();
    let linked = file.full_path(h.root.path());
    assert!(linked.exists());

    h.bundles().delete_file(file.id).await.unwrap();
    assert!(!linked.exists());
    // The original source is untouched.
    assert!(PathBuf::from(&path).exists());
    assert!(h.store.get_file_by_id(file.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_bundle_removes_included_directories() {
    let h = harness().await;
    let path = h.source("a.vcf", b"x");
    let request = h.request("case42", serde_json::json!([{"path": path}]));
    let (_, version) = h.bundles().add_bundle(&request).await.unwrap().unwrap();
    InclusionEngine::new(h.store.clone(), h.root.clone())
        .include_version(version.id)
        .await
        .unwrap();

    let version_dir = h.root.path().join("case42").join("2024-01-01");
    assert!(version_dir.exists());

    h.bundles().delete_bundle("case42").await.unwrap();
    assert!(!version_dir.exists());
    assert!(h.store.get_bundle_by_name("case42").await.unwrap().is_none());
}

#[tokio::test]
async fn test_checksum_round_trip() {
    let h = harness().await;
    let path = h.source("verify.cram", b"original content");
    let request = h.request("case42", serde_json::json!([{"path": path.clone(), "archive": true}]));
    h.bundles().add_bundle(&request).await.unwrap().unwrap();
    let file = h.store.get_files(&FilterParams::default()).await.unwrap()[0].clone();

    h.archives().submit_archiving(file.id, 1).await.unwrap();
    let file = h.store.get_file_by_id(file.id).await.unwrap().unwrap();
    assert!(file.checksum.is_some());

    // Unchanged content verifies.
    h.archives().verify_restored(&file).await.unwrap();

    // A corrupted restore does not.
    std::fs::write(&path, b"corrupted content").unwrap();
    let err = h.archives().verify_restored(&file).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_second_archive_submission_is_rejected() {
    let h = harness().await;
    let path = h.source("a.cram", b"x");
    let request = h.request("case42", serde_json::json!([{"path": path, "archive": true}]));
    h.bundles().add_bundle(&request).await.unwrap().unwrap();
    let file = &h.store.get_files(&FilterParams::default()).await.unwrap()[0];

    h.archives().submit_archiving(file.id, 1).await.unwrap();
    let err = h.archives().submit_archiving(file.id, 2).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Resubmission goes through the dedicated path instead.
    h.archives().resubmit_archiving(file.id, 2).await.unwrap();
    assert_eq!(h.store.get_archives(Some(2), None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_case_end_to_end() {
    let h = harness().await;
    let vcf = h.source("case42.vcf", b"variants");
    let cram = h.source("case42.cram", b"reads");

    let request = h.request(
        "case42",
        serde_json::json!([
            {"path": vcf, "tags": ["vcf", "sample"]},
            {"path": cram, "archive": true, "tags": ["cram"]},
        ]),
    );
    h.bundles().add_bundle(&request).await.unwrap().unwrap();

    let bundles = h.bundles();
    let by_vcf = bundles
        .get_files(
            &FilterParams {
                bundle_name: Some("case42".into()),
                tag_names: vec!["vcf".into()],
                ..Default::default()
            },
            false,
            false,
        )
        .await
        .unwrap();
    assert_eq!(by_vcf.len(), 1);
    assert!(by_vcf[0].path.ends_with("case42.vcf"));

    let to_archive = h
        .store
        .get_non_archived_files(&["cram".into()], None)
        .await
        .unwrap();
    assert_eq!(to_archive.len(), 1);
    assert!(to_archive[0].to_archive);

    assert_eq!(h.store.get_tags().await.unwrap().len(), 3);
}
