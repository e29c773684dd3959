//! Reconciliation pipeline
//!
//! Sequences one run per target: load the local file, fetch the current
//! remote document, reconcile, write the merged artifact, optionally publish.
//! Several targets can run concurrently; a shared semaphore caps how many
//! store calls are in flight at once.

use crate::artifact::{self, WriteOutcome};
use crate::document::{ConfigurationDocument, Unpaired};
use crate::error::FlagError;
use crate::reconcile::{reconcile, MergePolicy, MergeReport};
use crate::remote::retry::with_retry;
use crate::remote::{fetch_or_none, ConfigurationStore, RetryPolicy, Target, VersionHandle};
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

pub mod manifest;

pub use manifest::load_manifest;

/// One local file reconciled against one target.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileJob {
    pub config_file: PathBuf,
    pub target: Target,
    /// Defaults to `<config_file>.merged.json`
    pub output_file: Option<PathBuf>,
}

impl ReconcileJob {
    pub fn new(config_file: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            config_file: config_file.into(),
            target,
            output_file: None,
        }
    }

    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| artifact::default_output_path(&self.config_file))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Hand the merged document to the publisher after writing it.
    pub publish: bool,
    /// Reconcile only: neither write the artifact nor publish.
    pub dry_run: bool,
}

/// Everything a caller needs to know about one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub target: Target,
    pub config_file: PathBuf,
    pub output_file: PathBuf,
    pub fingerprint: String,
    pub structural_change: bool,
    /// `None` on a dry run.
    pub artifact: Option<WriteOutcome>,
    pub published_version: Option<VersionHandle>,
    pub unpaired: Unpaired,
    pub report: MergeReport,
    #[serde(skip)]
    pub document: ConfigurationDocument,
}

/// Read and validate a local flag file.
pub fn load_local(path: &Path) -> Result<ConfigurationDocument, FlagError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        FlagError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {}", path.display(), e),
        ))
    })?;
    ConfigurationDocument::parse(&raw)
}

/// Parse-only view of a local file, for `flagsync validate`.
#[derive(Debug, Clone, Serialize)]
pub struct LocalSummary {
    pub config_file: PathBuf,
    pub version: Option<String>,
    pub flags: usize,
    pub values: usize,
    pub enabled: usize,
    pub unpaired: Unpaired,
}

pub fn summarize_local(path: &Path) -> Result<LocalSummary, FlagError> {
    let document = load_local(path)?;
    Ok(LocalSummary {
        config_file: path.to_path_buf(),
        version: document.version.clone(),
        flags: document.flags.len(),
        values: document.values.len(),
        enabled: document
            .values
            .values()
            .filter(|v| v.enabled == Some(true))
            .count(),
        unpaired: document.unpaired(),
    })
}

pub struct Pipeline {
    store: Arc<dyn ConfigurationStore>,
    policy: MergePolicy,
    retry: RetryPolicy,
    limiter: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ConfigurationStore>,
        policy: MergePolicy,
        retry: RetryPolicy,
        max_in_flight: usize,
    ) -> Self {
        Self {
            store,
            policy,
            retry,
            limiter: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    async fn permit(&self) -> Result<tokio::sync::SemaphorePermit<'_>, FlagError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| FlagError::TransientError("store call limiter closed".to_string()))
    }

    /// Run one job end to end. Stops before publishing on any error.
    pub async fn run(&self, job: &ReconcileJob, options: RunOptions) -> Result<JobOutcome, FlagError> {
        job.target.validate()?;
        info!(
            config_file = %job.config_file.display(),
            triple = %job.target,
            "Processing configuration file"
        );

        let local = load_local(&job.config_file)?;
        let local_unpaired = local.unpaired();
        if !local_unpaired.is_empty() {
            debug!(
                triple = %job.target,
                flags_without_values = ?local_unpaired.flags_without_values,
                values_without_flags = ?local_unpaired.values_without_flags,
                "Local document has unpaired names"
            );
        }

        let snapshot = {
            let _permit = self.permit().await?;
            with_retry(&self.retry, "fetch", || {
                fetch_or_none(self.store.as_ref(), &job.target)
            })
            .await?
        };

        let (remote, previous_version) = match snapshot {
            Some(s) => (Some(s.document), Some(s.version)),
            None => (None, None),
        };

        let mut merged = reconcile(&local, remote.as_ref(), &self.policy).map_err(|e| match e {
            FlagError::RemoteStateRequired(_) => {
                FlagError::RemoteStateRequired(job.target.to_string())
            }
            other => other,
        })?;
        merged.report.previous_version = previous_version.map(|v| v.0);
        if let Some(previous) = &merged.report.previous_version {
            info!(
                triple = %job.target,
                from = %previous,
                "Configuration version reset to placeholder \"1\""
            );
        }

        let unpaired = merged.document.unpaired();
        if !unpaired.is_empty() {
            warn!(
                triple = %job.target,
                flags_without_values = ?unpaired.flags_without_values,
                values_without_flags = ?unpaired.values_without_flags,
                "Merged configuration has unpaired flags and values"
            );
        }

        let output_file = job.output_path();
        let bytes = merged.document.serialize()?;
        let fingerprint = merged.document.fingerprint()?;
        let structural_change = artifact::structural_change(
            artifact::read_existing(&output_file).as_ref(),
            &merged.document,
        );

        if options.dry_run {
            info!(triple = %job.target, fingerprint = %fingerprint, "Dry run, nothing written");
            return Ok(JobOutcome {
                target: job.target.clone(),
                config_file: job.config_file.clone(),
                output_file,
                fingerprint,
                structural_change,
                artifact: None,
                published_version: None,
                unpaired,
                report: merged.report,
                document: merged.document,
            });
        }

        let written = artifact::write_if_changed(&output_file, &bytes)?;

        let published_version = if options.publish {
            let _permit = self.permit().await?;
            let version = with_retry(&self.retry, "publish", || {
                self.store.publish(&merged.document, &job.target)
            })
            .await?;
            info!(triple = %job.target, version = %version, "Published merged configuration");
            Some(version)
        } else {
            None
        };

        Ok(JobOutcome {
            target: job.target.clone(),
            config_file: job.config_file.clone(),
            output_file,
            fingerprint,
            structural_change,
            artifact: Some(written),
            published_version,
            unpaired,
            report: merged.report,
            document: merged.document,
        })
    }

    /// Run every job concurrently. Results come back in job order; one
    /// failure does not stop the others.
    pub async fn run_all(
        &self,
        jobs: &[ReconcileJob],
        options: RunOptions,
    ) -> Vec<Result<JobOutcome, FlagError>> {
        join_all(jobs.iter().map(|job| self.run(job, options))).await
    }
}
