//! Merge and batch presentation: text/json.

use crate::artifact::WriteOutcome;
use crate::cli::output::map_error;
use crate::error::FlagError;
use crate::pipeline::{JobOutcome, ReconcileJob};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;
use std::collections::BTreeSet;

fn artifact_label(outcome: &JobOutcome) -> &'static str {
    match outcome.artifact {
        Some(WriteOutcome::Written) => "written",
        Some(WriteOutcome::Unchanged) => "unchanged",
        None => "dry run",
    }
}

fn short_fingerprint(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(12)]
}

pub fn format_merge_text(outcome: &JobOutcome) -> String {
    let report = &outcome.report;
    let mut out = format!("Target: {}\n", outcome.target);
    out.push_str(&format!("Config file: {}\n", outcome.config_file.display()));
    out.push_str(&format!(
        "Artifact: {} ({})\n",
        outcome.output_file.display(),
        artifact_label(outcome)
    ));
    out.push_str(&format!("Fingerprint: {}\n", short_fingerprint(&outcome.fingerprint)));
    if report.bootstrap {
        out.push_str("Remote: none published, local file used as-is\n");
    } else if let Some(ref previous) = report.previous_version {
        out.push_str(&format!("Remote: version {} (merged version reset to \"1\")\n", previous));
    }
    out.push_str(&format!(
        "Structural change: {}\n",
        if outcome.structural_change { "yes" } else { "no" }
    ));
    if let Some(ref version) = outcome.published_version {
        out.push_str(&format!("Published version: {}\n", version));
    }

    let keys: BTreeSet<&String> = report.definitions.keys().chain(report.values.keys()).collect();
    if !keys.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Flag", "Definition", "Value"]);
        for key in keys {
            let definition = report.definitions.get(key).map_or("-", |r| r.label());
            let value = report.values.get(key).map_or("-", |r| r.label());
            table.add_row(vec![key.as_str(), definition, value]);
        }
        out.push_str(&format!("\n{}\n", table));
    }

    if !report.carried_metadata.is_empty() {
        out.push_str(&format!(
            "\nCarried remote metadata: {}\n",
            report.carried_metadata.join(", ")
        ));
    }
    if !outcome.unpaired.flags_without_values.is_empty() {
        out.push_str(&format!(
            "\nWarning: flags without values: {}\n",
            outcome.unpaired.flags_without_values.join(", ")
        ));
    }
    if !outcome.unpaired.values_without_flags.is_empty() {
        out.push_str(&format!(
            "\nWarning: values without flags: {}\n",
            outcome.unpaired.values_without_flags.join(", ")
        ));
    }
    out
}

pub fn format_merge_json(outcome: &JobOutcome) -> String {
    serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_batch_text(jobs: &[ReconcileJob], results: &[Result<JobOutcome, FlagError>]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Target", "Status", "Artifact", "Published", "Detail"]);
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(outcome) => {
                let detail = if outcome.report.bootstrap {
                    "bootstrapped".to_string()
                } else {
                    format!(
                        "{} added, {} preserved",
                        outcome.report.added_flags().len(),
                        outcome.report.preserved_values().len()
                    )
                };
                table.add_row(vec![
                    job.target.to_string(),
                    "ok".to_string(),
                    artifact_label(outcome).to_string(),
                    outcome
                        .published_version
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |v| v.to_string()),
                    detail,
                ]);
            }
            Err(e) => {
                table.add_row(vec![
                    job.target.to_string(),
                    "failed".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    map_error(e),
                ]);
            }
        }
    }
    let failed = results.iter().filter(|r| r.is_err()).count();
    format!(
        "{}\n\nTotal: {} job(s), {} failed",
        table,
        results.len(),
        failed
    )
}

pub fn format_batch_json(jobs: &[ReconcileJob], results: &[Result<JobOutcome, FlagError>]) -> String {
    let entries: Vec<_> = jobs
        .iter()
        .zip(results)
        .map(|(job, result)| match result {
            Ok(outcome) => json!({
                "target": job.target,
                "ok": true,
                "outcome": outcome,
            }),
            Err(e) => json!({
                "target": job.target,
                "ok": false,
                "error": map_error(e),
            }),
        })
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    let out = json!({ "jobs": entries, "total": results.len(), "failed": failed });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
