//! flagsync: feature-flag configuration reconciliation
//!
//! Merges a locally authored flag document with the latest version hosted for
//! an (application, environment, profile) target, so that redeploying source
//! never silently drops flags or values created out-of-band. The merged
//! document is written as an artifact and can be published as a new hosted
//! version.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod reconcile;
pub mod remote;

pub use document::{ConfigurationDocument, FlagDefinition, FlagValue};
pub use error::FlagError;
pub use reconcile::{reconcile, MergePolicy, MergeReport, Reconciliation};
pub use remote::{Publisher, RemoteFetcher, Target};
