mod common;

use entra_auth::{InternalTokenValidator, InternalValidatorConfig, Requirement, ValidateToken};
use jsonwebtoken::Algorithm;
use serde_json::json;

use common::{sign_hmac, TestClaims};

const SECRET: &str = "an-internal-shared-secret-for-tests";

fn internal_claims() -> TestClaims {
    TestClaims::valid()
        .issuer("https://auth.internal.example.com")
        .audience("reporting-service")
}

#[tokio::test]
async fn hs256_token_round_trips() {
    let config = InternalValidatorConfig::new(SECRET)
        .with_issuer("https://auth.internal.example.com")
        .with_audience("reporting-service");
    let validator = InternalTokenValidator::new(config);

    let token = sign_hmac(&internal_claims(), SECRET, Algorithm::HS256);
    let result = validator.validate(&token, &Requirement::none()).await;

    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);
    let claims = result.claims.expect("accepted token must carry claims");
    assert_eq!(claims.issuer(), Some("https://auth.internal.example.com"));
}

#[tokio::test]
async fn bearer_prefix_is_stripped() {
    let validator = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));

    let token = sign_hmac(&internal_claims(), SECRET, Algorithm::HS256);
    let result = validator
        .validate(&format!("Bearer {token}"), &Requirement::none())
        .await;

    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);
}

#[tokio::test]
async fn wrong_secret_is_rejected_without_claims() {
    let validator = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));

    let token = sign_hmac(&internal_claims(), "a-different-secret", Algorithm::HS256);
    let result = validator.validate(&token, &Requirement::none()).await;

    assert!(!result.is_valid);
    assert!(result.claims.is_none());
    assert_eq!(result.error.as_deref(), Some("Invalid signature"));
}

#[tokio::test]
async fn algorithm_outside_allow_list_is_rejected() {
    // Only HS256 is allowed by default
    let validator = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));

    let token = sign_hmac(&internal_claims(), SECRET, Algorithm::HS512);
    let result = validator.validate(&token, &Requirement::none()).await;

    assert!(!result.is_valid);
    assert!(result.claims.is_none());
    let error = result.error.expect("rejections carry an error message");
    assert!(error.contains("not allowed"), "{error}");
}

#[tokio::test]
async fn widened_allow_list_accepts_hs512() {
    let config = InternalValidatorConfig::new(SECRET)
        .with_algorithms(vec![Algorithm::HS256, Algorithm::HS512])
        .unwrap();
    let validator = InternalTokenValidator::new(config);

    let token = sign_hmac(&internal_claims(), SECRET, Algorithm::HS512);
    let result = validator.validate(&token, &Requirement::none()).await;

    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);
}

#[tokio::test]
async fn empty_allow_list_is_a_config_error() {
    let result = InternalValidatorConfig::new(SECRET).with_algorithms(vec![]);
    assert!(matches!(
        result,
        Err(entra_auth::Error::NoAlgorithmsConfigured)
    ));
}

#[tokio::test]
async fn issuer_is_only_checked_when_configured() {
    let unchecked = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));
    let checked = InternalTokenValidator::new(
        InternalValidatorConfig::new(SECRET).with_issuer("https://auth.internal.example.com"),
    );

    let token = sign_hmac(
        &internal_claims().issuer("https://somewhere-else.example.com"),
        SECRET,
        Algorithm::HS256,
    );

    let result = unchecked.validate(&token, &Requirement::none()).await;
    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);

    let result = checked.validate(&token, &Requirement::none()).await;
    assert!(!result.is_valid);
    assert!(result.claims.is_some());
    assert_eq!(
        result.error.as_deref(),
        Some("Invalid issuer: https://somewhere-else.example.com")
    );
}

#[tokio::test]
async fn audience_is_only_checked_when_configured() {
    let unchecked = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));
    let checked = InternalTokenValidator::new(
        InternalValidatorConfig::new(SECRET).with_audience("reporting-service"),
    );

    let token = sign_hmac(
        &internal_claims().audience("billing-service"),
        SECRET,
        Algorithm::HS256,
    );

    let result = unchecked.validate(&token, &Requirement::none()).await;
    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);

    let result = checked.validate(&token, &Requirement::none()).await;
    assert!(!result.is_valid);
    assert!(result.claims.is_some());
    let error = result.error.expect("rejections carry an error message");
    assert!(error.contains("billing-service"), "{error}");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let validator = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));

    let now = chrono::Utc::now().timestamp();
    let token = sign_hmac(
        &internal_claims().expires_at(now - 120),
        SECRET,
        Algorithm::HS256,
    );

    let result = validator.validate(&token, &Requirement::none()).await;

    assert!(!result.is_valid);
    assert_eq!(result.error.as_deref(), Some("Token has expired"));
}

#[tokio::test]
async fn missing_exp_is_rejected_unless_exp_requirement_dropped() {
    let strict = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));
    let lenient = InternalTokenValidator::new(
        InternalValidatorConfig::new(SECRET).without_exp_requirement(),
    );

    let token = sign_hmac(&internal_claims().without("exp"), SECRET, Algorithm::HS256);

    let result = strict.validate(&token, &Requirement::none()).await;
    assert!(!result.is_valid);
    assert_eq!(result.error.as_deref(), Some("Missing required claim: exp"));

    let result = lenient.validate(&token, &Requirement::none()).await;
    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);
}

#[tokio::test]
async fn leeway_applies_to_internal_tokens() {
    let validator =
        InternalTokenValidator::new(InternalValidatorConfig::new(SECRET).with_leeway(60));

    let now = chrono::Utc::now().timestamp();
    let token = sign_hmac(
        &internal_claims().expires_at(now - 30),
        SECRET,
        Algorithm::HS256,
    );

    let result = validator.validate(&token, &Requirement::none()).await;
    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);
}

#[tokio::test]
async fn scope_requirements_apply_to_internal_tokens() {
    let validator = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));
    let requirement = Requirement::none().with_scopes(["reports:read"]);

    // Internal tokens carry scopes as an array claim
    let granted = sign_hmac(
        &internal_claims().scopes(&["reports:read", "reports:write"]),
        SECRET,
        Algorithm::HS256,
    );
    let result = validator.validate(&granted, &requirement).await;
    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);

    let denied = sign_hmac(
        &internal_claims().scopes(&["billing:read"]),
        SECRET,
        Algorithm::HS256,
    );
    let result = validator.validate(&denied, &requirement).await;
    assert!(!result.is_valid);
    assert!(result.claims.is_some());
}

#[tokio::test]
async fn role_requirements_apply_to_internal_tokens() {
    let validator = InternalTokenValidator::new(InternalValidatorConfig::new(SECRET));
    let requirement = Requirement::none().with_roles(["service"]);

    let token = sign_hmac(
        &internal_claims().claim("roles", json!(["service"])),
        SECRET,
        Algorithm::HS256,
    );
    let result = validator.validate(&token, &requirement).await;
    assert!(result.is_valid, "unexpected rejection: {:?}", result.error);
}
