//! Reconciliation scenarios through the public engine API

use flagsync::document::PLACEHOLDER_VERSION;
use flagsync::reconcile::Resolution;
use flagsync::{reconcile, ConfigurationDocument, FlagError, MergePolicy};
use serde_json::json;

fn doc(value: serde_json::Value) -> ConfigurationDocument {
    ConfigurationDocument::from_value(value).unwrap()
}

fn local_v1() -> ConfigurationDocument {
    doc(json!({
        "flags": {"f1": {"name": "f1"}},
        "values": {"f1": {"enabled": true}}
    }))
}

fn remote_v1() -> ConfigurationDocument {
    doc(json!({
        "version": "7",
        "flags": {"f1": {"name": "f1", "attributes": {"x": {"constraints": {"type": "number"}}}}},
        "values": {"f1": {"enabled": false, "note": "manual"}}
    }))
}

#[test]
fn test_scenario_a_preserve_keeps_remote_value_local_definition() {
    let merged = reconcile(&local_v1(), Some(&remote_v1()), &MergePolicy::preserving_remote()).unwrap();
    let out = merged.document.to_value().unwrap();

    assert_eq!(out["flags"]["f1"], json!({"name": "f1"}));
    assert_eq!(out["values"]["f1"], json!({"enabled": false, "note": "manual"}));
    assert_eq!(out["version"], json!(PLACEHOLDER_VERSION));
    assert_eq!(merged.report.definitions["f1"], Resolution::LocalWins);
    assert_eq!(merged.report.values["f1"], Resolution::RemoteWins);
}

#[test]
fn test_scenario_b_local_values_win_by_default() {
    let merged = reconcile(&local_v1(), Some(&remote_v1()), &MergePolicy::default()).unwrap();
    let out = merged.document.to_value().unwrap();

    assert_eq!(out["flags"]["f1"], json!({"name": "f1"}));
    assert_eq!(out["values"]["f1"], json!({"enabled": true}));
    assert_eq!(merged.report.overridden_values(), vec!["f1"]);
}

#[test]
fn test_scenario_c_remote_only_flags_survive() {
    let local = doc(json!({
        "flags": {"new_checkout": {"name": "new_checkout"}},
        "values": {"new_checkout": {"enabled": false}}
    }));
    let remote = doc(json!({
        "version": "12",
        "flags": {"hotfix_banner": {"name": "hotfix_banner"}},
        "values": {"hotfix_banner": {"enabled": true}}
    }));

    for policy in [MergePolicy::default(), MergePolicy::preserving_remote()] {
        let merged = reconcile(&local, Some(&remote), &policy).unwrap();
        let doc = &merged.document;
        assert_eq!(
            doc.flags.keys().collect::<Vec<_>>(),
            vec!["hotfix_banner", "new_checkout"]
        );
        assert_eq!(doc.values["hotfix_banner"].enabled, Some(true));
        assert_eq!(doc.values["new_checkout"].enabled, Some(false));
        assert_eq!(merged.report.added_flags(), vec!["new_checkout"]);
        assert_eq!(merged.report.remote_only_flags(), vec!["hotfix_banner"]);
        assert_eq!(doc.version.as_deref(), Some("1"));
    }
}

#[test]
fn test_no_remote_requires_force_create() {
    let err = reconcile(&local_v1(), None, &MergePolicy::default()).unwrap_err();
    assert!(matches!(err, FlagError::RemoteStateRequired(_)));

    let merged = reconcile(
        &local_v1(),
        None,
        &MergePolicy::default().with_force_create(true),
    )
    .unwrap();
    assert!(merged.report.bootstrap);
    assert_eq!(merged.document.flags, local_v1().flags);
    assert_eq!(merged.document.values, local_v1().values);
}

#[test]
fn test_malformed_documents_rejected() {
    let err = ConfigurationDocument::parse(r#"{"flags": "not-an-object"}"#).unwrap_err();
    assert!(matches!(err, FlagError::MalformedDocument(_)));

    let err = ConfigurationDocument::parse(r#"{"values": {"f": {"enabled": "yes"}}}"#).unwrap_err();
    assert!(matches!(err, FlagError::InvalidFlagValue { ref flag, .. } if flag == "f"));

    let err = ConfigurationDocument::parse("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, FlagError::MalformedDocument(_)));
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    for policy in [MergePolicy::default(), MergePolicy::preserving_remote()] {
        let first = reconcile(&local_v1(), Some(&remote_v1()), &policy).unwrap();
        let second = reconcile(&local_v1(), Some(&remote_v1()), &policy).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.document.serialize().unwrap(),
            second.document.serialize().unwrap()
        );
    }
}

#[test]
fn test_null_enabled_in_remote_is_rejected() {
    let err = ConfigurationDocument::from_value(json!({
        "flags": {"v": {"name": "v"}},
        "values": {"v": {"enabled": null, "note": "manual"}}
    }))
    .unwrap_err();
    assert!(matches!(err, FlagError::InvalidFlagValue { ref flag, .. } if flag == "v"));
}

#[test]
fn test_reconcile_converges_against_its_own_output() {
    let policy = MergePolicy::default();
    let first = reconcile(&local_v1(), Some(&remote_v1()), &policy).unwrap();
    let second = reconcile(&local_v1(), Some(&first.document), &policy).unwrap();
    assert_eq!(first.document, second.document);
    assert_eq!(
        first.document.serialize().unwrap(),
        second.document.serialize().unwrap()
    );
}

#[test]
fn test_unknown_fields_survive_a_merge() {
    let local = doc(json!({
        "flags": {"f": {"name": "f", "description": "owner: payments"}},
        "values": {"f": {"enabled": true, "rollout": 25}}
    }));
    let remote = doc(json!({
        "_createdAt": "2024-01-01T00:00:00Z",
        "flags": {"f": {"name": "f"}},
        "values": {"f": {"enabled": false}}
    }));
    let merged = reconcile(&local, Some(&remote), &MergePolicy::default()).unwrap();
    let out = merged.document.to_value().unwrap();

    assert_eq!(out["flags"]["f"]["description"], json!("owner: payments"));
    assert_eq!(out["values"]["f"]["rollout"], json!(25));
    assert_eq!(out["_createdAt"], json!("2024-01-01T00:00:00Z"));
    assert_eq!(merged.report.carried_metadata, vec!["_createdAt".to_string()]);
}
