//! End-to-end validation of signed subscriber tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use pretty_assertions::assert_eq;
use rstest::rstest;
use scribe_meta::TokenAlgorithm;
use scribe_token::{TokenError, TokenValidator, VerificationKey};
use serde_json::{Map, Value, json};

const RSA_PRIVATE: &str = include_str!("../../../test-fixtures/keys/rsa_private.pem");
const RSA_PUBLIC: &str = include_str!("../../../test-fixtures/keys/rsa_public.pem");
const RSA_OTHER_PUBLIC: &str = include_str!("../../../test-fixtures/keys/rsa_other_public.pem");
const EC_PRIVATE: &str = include_str!("../../../test-fixtures/keys/ec_private.pem");
const EC_PUBLIC: &str = include_str!("../../../test-fixtures/keys/ec_public.pem");

fn script_claims(n: usize) -> Value {
    let claims: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "subscription_uuid": format!("00000000-0000-0000-0000-{:012}", i + 1),
                "script_group_uuid": "00000000-0000-0000-0000-0000000000aa",
                "script_group_alt_id": "news",
                "script_uuid": format!("00000000-0000-0000-0001-{:012}", i + 1),
                "script_alt_id": "daily_digest"
            })
        })
        .collect();
    Value::String(Value::Array(claims).to_string())
}

/// Well-formed payload: issued a minute ago, expires in an hour, two claims
fn payload() -> Map<String, Value> {
    let now = Utc::now().timestamp();
    let mut map = Map::new();
    map.insert("sub".into(), json!("subscriber-42"));
    map.insert("iss".into(), json!("scribe"));
    map.insert("iat".into(), json!((now - 60).to_string()));
    map.insert("exp".into(), json!((now + 3600).to_string()));
    map.insert("claims".into(), script_claims(2));
    map
}

fn sign_rs256(payload: &Map<String, Value>) -> String {
    encode(
        &Header::new(Algorithm::RS256),
        payload,
        &EncodingKey::from_rsa_pem(RSA_PRIVATE.as_bytes()).unwrap(),
    )
    .unwrap()
}

fn rsa_key() -> VerificationKey {
    VerificationKey::from_pem(RSA_PUBLIC).unwrap()
}

fn validate(payload: &Map<String, Value>) -> Result<scribe_token::SubscriberToken, TokenError> {
    TokenValidator::default().validate(&sign_rs256(payload), &rsa_key())
}

#[test]
fn test_valid_token_decodes_all_fields() {
    let payload = payload();
    let token = validate(&payload).unwrap();

    assert_eq!(token.subject(), "subscriber-42");
    assert_eq!(token.issuer(), "scribe");
    assert_eq!(token.script_claims().len(), 2);
    assert!(token.issued_at() < token.expiration());
    assert_eq!(
        token.expiration().timestamp().to_string(),
        payload["exp"].as_str().unwrap()
    );
    assert_eq!(token.claims_for("news", "daily_digest").len(), 2);
}

#[test]
fn test_integer_timestamps_are_accepted() {
    let now = Utc::now().timestamp();
    let mut payload = payload();
    payload.insert("iat".into(), json!(now - 10));
    payload.insert("exp".into(), json!(now + 10));
    assert!(validate(&payload).is_ok());
}

#[test]
fn test_inline_claims_array_is_accepted() {
    let mut payload = payload();
    let serialized = script_claims(3);
    let inline: Value = serde_json::from_str(serialized.as_str().unwrap()).unwrap();
    payload.insert("claims".into(), inline);
    assert_eq!(validate(&payload).unwrap().script_claims().len(), 3);
}

#[test]
fn test_expired_by_one_second() {
    let mut payload = payload();
    payload.insert("exp".into(), json!((Utc::now().timestamp() - 1).to_string()));
    assert_eq!(validate(&payload).unwrap_err(), TokenError::ExpiredToken);
}

#[test]
fn test_expiring_exactly_now_is_expired() {
    let now = Utc::now();
    let mut payload = payload();
    payload.insert("exp".into(), json!(now.timestamp().to_string()));
    let token = sign_rs256(&payload);
    let now_whole = chrono::DateTime::from_timestamp(now.timestamp(), 0).unwrap();
    let err = TokenValidator::default()
        .validate_at(&token, &rsa_key(), now_whole)
        .unwrap_err();
    assert_eq!(err, TokenError::ExpiredToken);
}

#[test]
fn test_issued_in_the_future() {
    let mut payload = payload();
    let later = Utc::now() + Duration::hours(1);
    payload.insert("iat".into(), json!(later.timestamp().to_string()));
    payload.insert("exp".into(), json!((later + Duration::hours(1)).timestamp().to_string()));
    assert_eq!(validate(&payload).unwrap_err(), TokenError::TokenNotYetEffective);
}

#[rstest]
#[case::subject("sub", TokenError::MissingSubject)]
#[case::expiration("exp", TokenError::MissingExpiration)]
#[case::issuer("iss", TokenError::MissingIssuer)]
#[case::issued_at("iat", TokenError::MissingIssuedAt)]
#[case::claims("claims", TokenError::MissingClaims)]
fn test_missing_claim(#[case] claim: &str, #[case] expected: TokenError) {
    let mut payload = payload();
    payload.remove(claim);
    assert_eq!(validate(&payload).unwrap_err(), expected);
}

#[rstest]
#[case::subject("sub", TokenError::MissingSubject)]
#[case::issuer("iss", TokenError::MissingIssuer)]
#[case::claims("claims", TokenError::MissingClaims)]
fn test_empty_claim_counts_as_missing(#[case] claim: &str, #[case] expected: TokenError) {
    let mut payload = payload();
    payload.insert(claim.into(), json!(""));
    assert_eq!(validate(&payload).unwrap_err(), expected);
}

#[test]
fn test_presence_is_checked_before_expiry() {
    let mut payload = payload();
    payload.remove("sub");
    payload.insert("exp".into(), json!("0"));
    assert_eq!(validate(&payload).unwrap_err(), TokenError::MissingSubject);
}

#[test]
fn test_unparsable_expiration() {
    let mut payload = payload();
    payload.insert("exp".into(), json!("tomorrow"));
    assert_eq!(
        validate(&payload).unwrap_err(),
        TokenError::InvalidExpiration("tomorrow".to_string())
    );
}

#[test]
fn test_unparsable_issued_at() {
    let mut payload = payload();
    payload.insert("iat".into(), json!("yesterday"));
    assert_eq!(
        validate(&payload).unwrap_err(),
        TokenError::InvalidIssuedAt("yesterday".to_string())
    );
}

#[test]
fn test_malformed_claims_payload() {
    let mut payload = payload();
    payload.insert("claims".into(), json!("[{\"script_uuid\": \"nope\"}]"));
    assert!(matches!(
        validate(&payload).unwrap_err(),
        TokenError::ClaimsDecodeError(_)
    ));
}

#[test]
fn test_expiry_is_checked_before_claims_decode() {
    let mut payload = payload();
    payload.insert("claims".into(), json!("not json"));
    payload.insert("exp".into(), json!("1"));
    assert_eq!(validate(&payload).unwrap_err(), TokenError::ExpiredToken);
}

#[test]
fn test_wrong_key_is_invalid_token() {
    let other = VerificationKey::from_pem(RSA_OTHER_PUBLIC).unwrap();
    let err = TokenValidator::default()
        .validate(&sign_rs256(&payload()), &other)
        .unwrap_err();
    assert!(matches!(err, TokenError::InvalidToken(_)));
}

#[test]
fn test_garbage_is_invalid_token() {
    let err = TokenValidator::default()
        .validate("not.a.token", &rsa_key())
        .unwrap_err();
    assert!(matches!(err, TokenError::InvalidToken(_)));
}

#[test]
fn test_tampered_payload_is_invalid_token() {
    let token = sign_rs256(&payload());
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged = sign_rs256(&{
        let mut p = payload();
        p.insert("sub".into(), json!("someone-else"));
        p
    });
    let forged_body = forged.split('.').nth(1).unwrap().to_string();
    parts[1] = &forged_body;
    let err = TokenValidator::default()
        .validate(&parts.join("."), &rsa_key())
        .unwrap_err();
    assert!(matches!(err, TokenError::InvalidToken(_)));
}

#[test]
fn test_es256_tokens() {
    let token = encode(
        &Header::new(Algorithm::ES256),
        &payload(),
        &EncodingKey::from_ec_pem(EC_PRIVATE.as_bytes()).unwrap(),
    )
    .unwrap();
    let key = VerificationKey::from_pem(EC_PUBLIC).unwrap();

    let decoded = TokenValidator::new(TokenAlgorithm::Es256)
        .validate(&token, &key)
        .unwrap();
    assert_eq!(decoded.script_claims().len(), 2);

    // An RS256 validator refuses the ES256 token
    let err = TokenValidator::default().validate(&token, &key).unwrap_err();
    assert!(matches!(err, TokenError::InvalidToken(_)));
}

#[test]
fn test_expected_issuer() {
    let token = sign_rs256(&payload());
    let validator = TokenValidator::default().with_expected_issuer("someone-else");
    let err = validator.validate(&token, &rsa_key()).unwrap_err();
    assert_eq!(
        err,
        TokenError::UnexpectedIssuer {
            expected: "someone-else".to_string(),
            actual: "scribe".to_string(),
        }
    );

    let validator = TokenValidator::default().with_expected_issuer("scribe");
    assert!(validator.validate(&token, &rsa_key()).is_ok());
}

#[test]
fn test_claims_decode_is_checked_before_issuer() {
    let mut payload = payload();
    payload.insert("claims".into(), json!("not json"));
    let token = sign_rs256(&payload);

    let validator = TokenValidator::default().with_expected_issuer("someone-else");
    assert!(matches!(
        validator.validate(&token, &rsa_key()).unwrap_err(),
        TokenError::ClaimsDecodeError(_)
    ));
}
