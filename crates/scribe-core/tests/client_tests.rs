//! CatalogClient against an in-memory catalog

use pretty_assertions::assert_eq;
use scribe_core::{CatalogClient, Error, GatewayError};
use scribe_meta::{DuplicatePolicy, Settings};
use scribe_test_utils::{CallKind, MemoryGateway, TestProject, TokenPayload, fixture_manifest};
use scribe_token::{ScriptClaim, TokenError};
use scribe_types::Identity;
use uuid::Uuid;

fn claim(group: &str, script: &str) -> ScriptClaim {
    ScriptClaim {
        subscription_uuid: Uuid::new_v4(),
        script_group_uuid: Uuid::new_v4(),
        script_group_alt_id: group.to_string(),
        script_uuid: Uuid::new_v4(),
        script_alt_id: script.to_string(),
    }
}

#[test]
fn test_reconcile_and_plan() {
    let manifest = fixture_manifest("acme.toml");
    let client = CatalogClient::new(MemoryGateway::new());

    let plan = client.plan(&manifest).unwrap();
    assert!(plan.dry_run);
    assert_eq!(plan.creates().len(), 6);
    assert!(client.gateway().writes().is_empty());

    let report = client.reconcile(&manifest).unwrap();
    assert!(!report.dry_run);
    assert_eq!(client.gateway().writes().len(), 6);

    let plan = client.plan(&manifest).unwrap();
    assert_eq!(plan.writes(), 0);
}

#[test]
fn test_settings_drive_options() {
    let project = TestProject::new();
    project.write_settings("[sync]\ndry_run = true\nduplicate_policy = \"skip\"\n");
    let settings = project.resolver().resolve().unwrap();

    let client = CatalogClient::with_settings(MemoryGateway::new(), &settings);
    assert!(client.options().dry_run);
    assert_eq!(client.options().duplicate_policy, DuplicatePolicy::Skip);

    let report = client.reconcile(&fixture_manifest("acme.toml")).unwrap();
    assert!(report.dry_run);
    assert!(client.gateway().writes().is_empty());
}

#[test]
fn test_register_provider_issues_keys() {
    let manifest = fixture_manifest("acme.toml");
    let client = CatalogClient::new(MemoryGateway::new());

    let (id, keys) = client.register_provider(&manifest.provider).unwrap();
    assert!(!keys.api_key.is_empty());
    assert!(!keys.secret_key.is_empty());
    assert_eq!(client.gateway().count(CallKind::ResetKeys), 1);

    // Reconcile adopts the registered provider instead of creating another
    let report = client.reconcile(&manifest).unwrap();
    assert_eq!(report.provider_id, Some(id));
    assert_eq!(client.gateway().count(CallKind::CreateProvider), 1);

    let rotated = client.reset_provider_keys(id).unwrap();
    assert_ne!(rotated.api_key, keys.api_key);
}

#[test]
fn test_set_provider_public() {
    let manifest = fixture_manifest("acme.toml");
    let client = CatalogClient::new(MemoryGateway::new());
    let id = client.reconcile(&manifest).unwrap().provider_id.unwrap();

    client.set_provider_public(id, false).unwrap();
    assert!(!client.gateway().provider_fields("acme").unwrap().public);

    // The manifest says public, so the next pass restores it
    let report = client.reconcile(&manifest).unwrap();
    assert_eq!(report.updates().len(), 1);
    assert!(client.gateway().provider_fields("acme").unwrap().public);
}

#[test]
fn test_read_passthrough() {
    let manifest = fixture_manifest("acme.toml");
    let client = CatalogClient::new(MemoryGateway::new());
    let report = client.reconcile(&manifest).unwrap();
    let provider_id = report.provider_id.unwrap();
    let group_id = report.resolved_id("acme/news").unwrap();

    let news = Identity::parse("news").unwrap();
    let group = client.read_script_group(provider_id, &news).unwrap().unwrap();
    assert_eq!(group.id, group_id);
    assert_eq!(group.scripts.len(), 2);

    let digest = Identity::parse("daily_digest").unwrap();
    let script = client.read_script(provider_id, group_id, &digest).unwrap().unwrap();
    assert_eq!(Some(script.id), report.resolved_id("acme/news/daily_digest"));

    let missing = Identity::parse("missing").unwrap();
    assert!(client.read_script(provider_id, group_id, &missing).unwrap().is_none());
}

#[test]
fn test_issue_and_validate_subscriber_token() {
    let gateway = MemoryGateway::new();
    gateway.grant("subscriber-7", claim("news", "daily_digest"));
    gateway.grant("subscriber-7", claim("news", "weekly_roundup"));
    gateway.grant("someone-else", claim("markets", "market_close"));
    let mut client = CatalogClient::new(gateway);

    let token = client.issue_subscriber_token("subscriber-7").unwrap();
    let decoded = client.validate_subscriber_token(&token).unwrap();

    assert_eq!(decoded.subject(), "subscriber-7");
    assert_eq!(decoded.script_claims().len(), 2);
    assert_eq!(decoded.claims_for("news", "daily_digest").len(), 1);
    assert!(decoded.claims_for("markets", "market_close").is_empty());
}

#[test]
fn test_signing_key_is_fetched_once() {
    let mut client = CatalogClient::new(MemoryGateway::new());
    let token = TokenPayload::new("subscriber-1").sign_rs256();

    client.validate_subscriber_token(&token).unwrap();
    client.validate_subscriber_token(&token).unwrap();
    assert_eq!(client.gateway().count(CallKind::FetchSigningKey), 1);

    client.refresh_signing_key();
    client.validate_subscriber_token(&token).unwrap();
    assert_eq!(client.gateway().count(CallKind::FetchSigningKey), 2);
}

#[test]
fn test_token_errors_surface_unchanged() {
    let mut client = CatalogClient::new(MemoryGateway::new());

    let expired = TokenPayload::new("subscriber-1").expired().sign_rs256();
    assert!(matches!(
        client.validate_subscriber_token(&expired),
        Err(Error::Token(TokenError::ExpiredToken))
    ));

    let anonymous = TokenPayload::new("subscriber-1").without("sub").sign_rs256();
    assert!(matches!(
        client.validate_subscriber_token(&anonymous),
        Err(Error::Token(TokenError::MissingSubject))
    ));
}

#[test]
fn test_key_fetch_failure_is_retried_next_time() {
    let gateway = MemoryGateway::new();
    gateway.fail_on(CallKind::FetchSigningKey, "");
    let mut client = CatalogClient::new(gateway);
    let token = TokenPayload::new("subscriber-1").sign_rs256();

    let err = client.validate_subscriber_token(&token).unwrap_err();
    assert!(matches!(
        err,
        Error::Remote {
            source: GatewayError::Rejected(_),
            ..
        }
    ));

    client.gateway().clear_failures();
    assert!(client.validate_subscriber_token(&token).is_ok());
    assert_eq!(client.gateway().count(CallKind::FetchSigningKey), 2);
}

#[test]
fn test_issue_token_requires_subscriber() {
    let client = CatalogClient::new(MemoryGateway::new());
    assert!(matches!(
        client.issue_subscriber_token(""),
        Err(Error::Remote { .. })
    ));
}

#[test]
fn test_expected_issuer_from_settings() {
    let mut settings = Settings::default();
    settings.tokens.expected_issuer = Some("another-issuer".to_string());
    let mut client = CatalogClient::with_settings(MemoryGateway::new(), &settings);

    let token = TokenPayload::new("subscriber-1").sign_rs256();
    assert!(matches!(
        client.validate_subscriber_token(&token),
        Err(Error::Token(TokenError::UnexpectedIssuer { .. }))
    ));
}
