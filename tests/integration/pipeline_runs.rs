//! End-to-end pipeline runs against the in-memory store

use crate::integration::test_utils::{fast_retry, write_file};
use flagsync::artifact::WriteOutcome;
use flagsync::pipeline::{JobOutcome, Pipeline, ReconcileJob, RunOptions};
use async_trait::async_trait;
use flagsync::remote::{
    InMemoryStore, Publisher, RemoteFetcher, RemoteSnapshot, Target, VersionHandle,
};
use flagsync::{ConfigurationDocument, FlagError, FlagValue, MergePolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const LOCAL: &str = r#"{
  "flags": {"search_v2": {"name": "search_v2"}},
  "values": {"search_v2": {"enabled": true}}
}"#;

fn target() -> Target {
    Target::new("catalog", "prod", "feature-flags")
}

fn publish() -> RunOptions {
    RunOptions {
        publish: true,
        dry_run: false,
    }
}

fn remote_with_hotfix() -> ConfigurationDocument {
    ConfigurationDocument::parse(
        r#"{
  "version": "3",
  "_createdBy": "console",
  "flags": {
    "search_v2": {"name": "search_v2"},
    "hotfix": {"name": "hotfix"}
  },
  "values": {
    "search_v2": {"enabled": false},
    "hotfix": {"enabled": true}
  }
}"#,
    )
    .unwrap()
}

async fn run_once(pipeline: &Pipeline, job: &ReconcileJob) -> JobOutcome {
    pipeline.run(job, publish()).await.unwrap()
}

#[tokio::test]
async fn test_publish_then_rerun_is_stable() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "flags.json", LOCAL);
    let store = Arc::new(InMemoryStore::new());
    store.seed(&target(), remote_with_hotfix());
    let pipeline = Pipeline::new(store.clone(), MergePolicy::default(), fast_retry(3), 2);
    let job = ReconcileJob::new(file, target());

    let first = run_once(&pipeline, &job).await;
    assert_eq!(first.artifact, Some(WriteOutcome::Written));
    assert_eq!(first.report.previous_version.as_deref(), Some("1"));
    assert_eq!(first.published_version.as_ref().map(|v| v.0.as_str()), Some("2"));
    assert!(first.structural_change);

    let published = store.latest(&target()).unwrap();
    assert_eq!(published, first.document);
    assert_eq!(published.values["hotfix"].enabled, Some(true));
    assert_eq!(published.values["search_v2"].enabled, Some(true));
    assert!(published.metadata.contains_key("_createdBy"));

    // Second run merges against what the first one published.
    let second = run_once(&pipeline, &job).await;
    assert_eq!(second.artifact, Some(WriteOutcome::Unchanged));
    assert_eq!(second.fingerprint, first.fingerprint);
    assert!(!second.structural_change);
    assert_eq!(second.document, first.document);
    assert_eq!(store.version_count(&target()), 3);
}

#[tokio::test]
async fn test_preserve_policy_keeps_console_edits() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "flags.json", LOCAL);
    let store = Arc::new(InMemoryStore::new());
    store.seed(&target(), remote_with_hotfix());
    let pipeline = Pipeline::new(
        store.clone(),
        MergePolicy::preserving_remote(),
        fast_retry(3),
        2,
    );

    let outcome = run_once(&pipeline, &ReconcileJob::new(file, target())).await;
    assert_eq!(outcome.document.values["search_v2"].enabled, Some(false));
    assert_eq!(outcome.report.preserved_values(), vec!["search_v2"]);
}

#[tokio::test]
async fn test_transient_fetch_faults_are_retried() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "flags.json", LOCAL);
    let store = Arc::new(InMemoryStore::new());
    store.seed(&target(), remote_with_hotfix());
    store.fail_next_fetches(2);
    store.fail_next_publishes(1);
    let pipeline = Pipeline::new(store.clone(), MergePolicy::default(), fast_retry(3), 1);

    let outcome = run_once(&pipeline, &ReconcileJob::new(file, target())).await;
    assert_eq!(outcome.published_version.map(|v| v.0), Some("2".to_string()));
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "flags.json", LOCAL);
    let store = Arc::new(InMemoryStore::new());
    store.seed(&target(), remote_with_hotfix());
    store.fail_next_fetches(5);
    let pipeline = Pipeline::new(store.clone(), MergePolicy::default(), fast_retry(3), 1);
    let job = ReconcileJob::new(file, target());

    let err = pipeline.run(&job, publish()).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!job.output_path().exists());
    assert_eq!(store.version_count(&target()), 1);
}

#[tokio::test]
async fn test_force_create_bootstraps_unknown_target() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "flags.json", LOCAL);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        store.clone(),
        MergePolicy::default().with_force_create(true),
        fast_retry(2),
        1,
    );

    let outcome = run_once(&pipeline, &ReconcileJob::new(file, target())).await;
    assert!(outcome.report.bootstrap);
    assert_eq!(outcome.report.previous_version, None);
    assert_eq!(store.version_count(&target()), 1);
    assert_eq!(
        store.latest(&target()).unwrap().version.as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn test_run_all_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let good = write_file(dir.path(), "good.json", LOCAL);
    let bad = write_file(dir.path(), "bad.json", r#"{"values": {"x": {"enabled": 1}}}"#);
    let store = Arc::new(InMemoryStore::new());
    let other = Target::new("catalog", "staging", "feature-flags");
    store.seed(&target(), ConfigurationDocument::new());
    store.seed(
        &other,
        ConfigurationDocument::new().with_value("legacy", FlagValue::enabled(true)),
    );
    let pipeline = Pipeline::new(store.clone(), MergePolicy::default(), fast_retry(2), 2);

    let jobs = vec![
        ReconcileJob::new(good, target()),
        ReconcileJob::new(bad, other.clone()),
    ];
    let results = pipeline.run_all(&jobs, publish()).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(FlagError::InvalidFlagValue { .. })
    ));
    assert_eq!(store.version_count(&target()), 2);
    assert_eq!(store.version_count(&other), 1);
}

#[tokio::test]
async fn test_explicit_output_file() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "flags.json", LOCAL);
    let output = dir.path().join("out").join("merged.json");
    let store = Arc::new(InMemoryStore::new());
    store.seed(&target(), remote_with_hotfix());
    let pipeline = Pipeline::new(store, MergePolicy::default(), fast_retry(1), 1);

    let job = ReconcileJob::new(file.clone(), target()).with_output_file(output.clone());
    let outcome = pipeline.run(&job, RunOptions::default()).await.unwrap();
    assert_eq!(outcome.output_file, output);
    assert!(output.exists());
    assert!(!dir.path().join("flags.json.merged.json").exists());

    let written = ConfigurationDocument::parse(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, outcome.document);
}

/// In-memory store that records the peak number of concurrent calls.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryStore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingStore {
    async fn track<T>(&self, call: impl std::future::Future<Output = T>) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let result = call.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl RemoteFetcher for CountingStore {
    async fn fetch_current(&self, target: &Target) -> Result<Option<RemoteSnapshot>, FlagError> {
        self.track(self.inner.fetch_current(target)).await
    }
}

#[async_trait]
impl Publisher for CountingStore {
    async fn publish(
        &self,
        document: &ConfigurationDocument,
        target: &Target,
    ) -> Result<VersionHandle, FlagError> {
        self.track(self.inner.publish(document, target)).await
    }
}

#[tokio::test]
async fn test_run_all_respects_in_flight_cap() {
    for cap in [1usize, 2] {
        let dir = TempDir::new().unwrap();
        let jobs: Vec<ReconcileJob> = (0..6)
            .map(|i| {
                let file = write_file(dir.path(), &format!("svc{i}.json"), LOCAL);
                ReconcileJob::new(file, Target::new(format!("svc{i}"), "prod", "flags"))
            })
            .collect();
        let store = Arc::new(CountingStore::default());
        let pipeline = Pipeline::new(
            store.clone(),
            MergePolicy::default().with_force_create(true),
            fast_retry(2),
            cap,
        );

        let results = pipeline.run_all(&jobs, publish()).await;

        assert!(results.iter().all(|r| r.is_ok()));
        // One fetch and one publish per job.
        assert_eq!(store.calls.load(Ordering::SeqCst), 12);
        assert_eq!(store.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(store.peak.load(Ordering::SeqCst), cap, "cap {cap}");
    }
}
