//! Filesystem store behavior through the pipeline

use crate::integration::test_utils::{fast_retry, write_file};
use flagsync::pipeline::{Pipeline, ReconcileJob, RunOptions};
use flagsync::remote::{fetch_or_none, DirectoryStore, Publisher, RemoteFetcher, Target};
use flagsync::{ConfigurationDocument, FlagDefinition, FlagError, FlagValue, MergePolicy};
use std::sync::Arc;
use tempfile::TempDir;

fn target() -> Target {
    Target::new("billing", "prod", "flags")
}

#[tokio::test]
async fn test_missing_application_reads_as_no_state() {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path().join("store"));

    let err = store.fetch_current(&target()).await.unwrap_err();
    assert!(matches!(err, FlagError::NotFound(ref what) if what.contains("billing")));
    assert!(fetch_or_none(&store, &target()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_profile_has_no_versions() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("billing/prod/flags")).unwrap();
    let store = DirectoryStore::new(dir.path());

    assert!(store.fetch_current(&target()).await.unwrap().is_none());
    assert!(store.list_versions(&target()).unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_allocates_increasing_versions() {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path());
    let doc = ConfigurationDocument::new()
        .with_flag("invoice_pdf", FlagDefinition::named("invoice_pdf"))
        .with_value("invoice_pdf", FlagValue::enabled(false));

    let v1 = store.publish(&doc, &target()).await.unwrap();
    let v2 = store.publish(&doc, &target()).await.unwrap();
    assert_eq!(v1.0, "1");
    assert_eq!(v2.0, "2");
    assert_eq!(store.list_versions(&target()).unwrap(), vec![1, 2]);

    let snapshot = store.fetch_current(&target()).await.unwrap().unwrap();
    assert_eq!(snapshot.version.0, "2");
    assert_eq!(snapshot.document.values["invoice_pdf"].enabled, Some(false));
}

#[tokio::test]
async fn test_pipeline_round_trip_through_directory_store() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DirectoryStore::new(dir.path().join("store")));
    let local = write_file(
        dir.path(),
        "billing.json",
        r#"{"flags": {"invoice_pdf": {}}, "values": {"invoice_pdf": {"enabled": true}}}"#,
    );
    let job = ReconcileJob::new(local, target());
    let options = RunOptions {
        publish: true,
        dry_run: false,
    };

    let strict = Pipeline::new(store.clone(), MergePolicy::default(), fast_retry(2), 1);
    let err = strict.run(&job, options).await.unwrap_err();
    assert!(matches!(err, FlagError::RemoteStateRequired(ref t) if t == "billing/prod/flags"));

    let bootstrap = Pipeline::new(
        store.clone(),
        MergePolicy::default().with_force_create(true),
        fast_retry(2),
        1,
    );
    let first = bootstrap.run(&job, options).await.unwrap();
    assert!(first.report.bootstrap);

    // Someone adds a flag out-of-band as a new hosted version.
    let mut edited = first.document.clone();
    edited
        .flags
        .insert("dunning".to_string(), FlagDefinition::named("dunning"));
    edited
        .values
        .insert("dunning".to_string(), FlagValue::enabled(true));
    store.publish(&edited, &target()).await.unwrap();

    let second = strict.run(&job, options).await.unwrap();
    assert_eq!(second.report.previous_version.as_deref(), Some("2"));
    assert_eq!(second.report.remote_only_flags(), vec!["dunning"]);
    assert_eq!(second.published_version.map(|v| v.0), Some("3".to_string()));

    let latest = store.fetch_current(&target()).await.unwrap().unwrap();
    assert!(latest.document.flags.contains_key("dunning"));
    assert!(latest.document.flags.contains_key("invoice_pdf"));
    assert_eq!(latest.document.version.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_invalid_target_rejected_before_io() {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path());
    let bad = Target::new("..", "prod", "flags");

    assert!(store.publish(&ConfigurationDocument::new(), &bad).await.is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
