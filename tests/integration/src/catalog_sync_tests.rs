//! End-to-end catalog sync
//!
//! These tests exercise the complete flow a caller goes through: settings
//! resolution -> manifest loading -> reconciliation -> subscriber tokens.

use std::collections::HashMap;

use scribe_core::{Action, CatalogClient, Credentials, Error};
use scribe_meta::Manifest;
use scribe_test_utils::{CallKind, MemoryGateway, TestProject, logging};
use scribe_token::ScriptClaim;

const MANIFEST: &str = r#"
[provider]
alt_id = "acme"
name = "Acme Scripts"
description = "Research scripts from Acme"
public = true

[[provider.script_groups]]
alt_id = "news"
name = "News"
description = "News summaries"

[[provider.script_groups.scripts]]
alt_id = "daily_digest"
name = "Daily digest"
description = "One summary a day"
recurrence = "daily"
price = "0.99"
sla_sec = 3600
token_lifetime_sec = 86400

[[provider.script_groups.scripts]]
alt_id = "weekly_roundup"
name = "Weekly roundup"
description = "The week in one page"
recurrence = "weekly"
price = "2.99"
sla_sec = 7200
token_lifetime_sec = 604800
"#;

fn client_for(project: &TestProject) -> CatalogClient<MemoryGateway> {
    let settings = project.resolver().resolve().unwrap();
    CatalogClient::with_settings(MemoryGateway::new(), &settings)
}

#[test]
fn test_manifest_file_round_trip_through_catalog() {
    let _ = logging::init();
    let project = TestProject::new();
    let path = project.write_manifest(MANIFEST);
    let client = client_for(&project);

    let manifest = Manifest::load(&path).unwrap();
    let first = client.reconcile(&manifest).unwrap();
    assert_eq!(first.creates().len(), 4);
    assert!(first.is_success());

    // Reloading the same file is a no-op
    let second = client.reconcile(&Manifest::load(&path).unwrap()).unwrap();
    assert_eq!(second.writes(), 0);

    // Edit the file: reprice one script, drop another
    let edited = MANIFEST
        .replace("price = \"0.99\"", "price = \"1.49\"")
        .split("[[provider.script_groups.scripts]]\nalt_id = \"weekly_roundup\"")
        .next()
        .unwrap()
        .to_string();
    project.write_manifest(&edited);

    let third = client.reconcile(&Manifest::load(&path).unwrap()).unwrap();
    assert_eq!(third.updates().len(), 1);
    assert_eq!(third.retires().len(), 1);
    assert_eq!(
        third.action_for("acme/news/weekly_roundup").map(|a| a.action),
        Some(Action::Retired)
    );
    assert_eq!(
        client
            .gateway()
            .script_fields("acme", "news", "daily_digest")
            .unwrap()
            .price_in_cents
            .cents_value(),
        149
    );

    // Every node keeps its server id across passes
    for path in ["acme", "acme/news", "acme/news/daily_digest"] {
        assert_eq!(first.resolved_id(path), third.resolved_id(path), "{path}");
    }
}

#[test]
fn test_dry_run_from_project_settings() {
    let project = TestProject::new();
    project.write_settings("[sync]\ndry_run = true\n");
    let path = project.write_manifest(MANIFEST);
    let client = client_for(&project);

    let report = client.reconcile(&Manifest::load(&path).unwrap()).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.writes(), 4);
    assert!(client.gateway().writes().is_empty());

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["actions"].as_array().unwrap().len(), 4);
}

#[test]
fn test_duplicate_manifest_is_rejected_on_load() {
    let project = TestProject::new();
    let duplicated = MANIFEST.replace("alt_id = \"weekly_roundup\"", "alt_id = \"daily_digest\"");
    let path = project.write_manifest(&duplicated);

    let err = Manifest::load(&path).unwrap_err();
    assert!(matches!(err, scribe_meta::Error::DuplicateIdentity { .. }));
}

#[test]
fn test_credentials_from_layers() {
    let project = TestProject::new();
    project.write_global_settings("[api]\nurl = \"https://catalog.example.com/graphql\"\n");
    project.write_settings("[api]\napi_key = \"project-key\"\ntimeout_secs = 10\n");

    let resolver = project.resolver();
    let err = Credentials::from_settings(&resolver.resolve().unwrap()).unwrap_err();
    assert!(matches!(err, Error::MissingCredential { name: "secret key" }));

    let env = HashMap::from([("MYSCRIBAE_SECRET_KEY".to_string(), "s3cret".to_string())]);
    let settings = project.resolver_with_env(env).resolve().unwrap();
    let credentials = Credentials::from_settings(&settings).unwrap();
    assert_eq!(credentials.api_url, "https://catalog.example.com/graphql");
    assert_eq!(credentials.api_key, "project-key");
    assert_eq!(credentials.timeout.as_secs(), 10);
}

#[test]
fn test_subscriber_entitlements_follow_catalog_ids() {
    let project = TestProject::new();
    let path = project.write_manifest(MANIFEST);
    let mut client = client_for(&project);
    let report = client.reconcile(&Manifest::load(&path).unwrap()).unwrap();

    let group_id = report.resolved_id("acme/news").unwrap();
    let script_id = report.resolved_id("acme/news/daily_digest").unwrap();
    client.gateway().grant(
        "subscriber-9",
        ScriptClaim {
            subscription_uuid: uuid::Uuid::new_v4(),
            script_group_uuid: group_id,
            script_group_alt_id: "news".to_string(),
            script_uuid: script_id,
            script_alt_id: "daily_digest".to_string(),
        },
    );

    let token = client.issue_subscriber_token("subscriber-9").unwrap();
    let decoded = client.validate_subscriber_token(&token).unwrap();

    assert!(decoded.grants_script(script_id));
    let weekly = report.resolved_id("acme/news/weekly_roundup").unwrap();
    assert!(!decoded.grants_script(weekly));
    assert_eq!(client.gateway().count(CallKind::IssueToken), 1);
}
