//! Validate presentation: text/json.

use crate::pipeline::LocalSummary;

pub fn format_validate_text(summary: &LocalSummary) -> String {
    let mut out = format!("Config file: {}\n", summary.config_file.display());
    out.push_str(&format!(
        "Version: {}\n",
        summary.version.as_deref().unwrap_or("(none)")
    ));
    out.push_str(&format!("Flags: {}\n", summary.flags));
    out.push_str(&format!("Values: {} ({} enabled)\n", summary.values, summary.enabled));
    if summary.unpaired.is_empty() {
        out.push_str("Every flag has a value.\n");
    } else {
        if !summary.unpaired.flags_without_values.is_empty() {
            out.push_str(&format!(
                "Flags without values: {}\n",
                summary.unpaired.flags_without_values.join(", ")
            ));
        }
        if !summary.unpaired.values_without_flags.is_empty() {
            out.push_str(&format!(
                "Values without flags: {}\n",
                summary.unpaired.values_without_flags.join(", ")
            ));
        }
    }
    out
}

pub fn format_validate_json(summary: &LocalSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}
