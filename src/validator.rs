use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::access::evaluate;
use crate::access::Requirement;
use crate::claims::Claims;
use crate::config::EntraValidatorConfig;
use crate::config::InternalValidatorConfig;
use crate::error::Error;
use crate::error::Result;
use crate::jwks::FetchKeys;
use crate::jwks::HttpKeyFetcher;
use crate::jwks::KeyStore;

/// The uniform outcome of a validation call
///
/// Three states are possible and callers must distinguish them:
/// valid with claims, rejected with claims (the token verified
/// cryptographically but failed a policy or authorization check), and
/// rejected without claims (the token never earned trust). `claims` being
/// present therefore does not imply the token was accepted.
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

impl ValidationResult {
    fn accepted(claims: Claims) -> Self {
        Self {
            is_valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    fn rejected(error: &Error) -> Self {
        Self {
            is_valid: false,
            claims: None,
            error: Some(error.to_string()),
        }
    }

    fn rejected_with_claims(claims: Claims, error: &Error) -> Self {
        Self {
            is_valid: false,
            claims: Some(claims),
            error: Some(error.to_string()),
        }
    }
}

/// Common contract for both token validators
///
/// Callers that accept either token family can hold both validators behind
/// this trait and try them in whatever order their policy dictates; each
/// validator only ever judges a token against its own configuration.
#[async_trait]
pub trait ValidateToken: Send + Sync {
    /// Validate a bearer token (with or without the `"Bearer "` prefix)
    /// against this validator's policy and the given requirement
    async fn validate(&self, token: &str, requirement: &Requirement) -> ValidationResult;
}

/// Remove the `"Bearer "` scheme prefix if present
pub fn strip_bearer(token: &str) -> &str {
    token.strip_prefix("Bearer ").unwrap_or(token)
}

/// Reject tokens whose `iat` lies in the future beyond the leeway. The JWT
/// library checks `exp` and `nbf` but leaves `iat` to us.
fn check_issued_at(claims: &Claims, leeway_secs: u64) -> Result<()> {
    if let Some(iat) = claims.issued_at() {
        if iat > Utc::now().timestamp() + leeway_secs as i64 {
            return Err(Error::TokenNotYetValid);
        }
    }

    Ok(())
}

/// Validates JWT tokens issued by Microsoft Entra ID (Azure AD)
///
/// Supports both v1.0 and v2.0 tokens: the issuer may be either historical
/// URL scheme for the tenant, and the audience may be the bare client ID or
/// its `api://` resource-URI form. Signing keys are resolved by `kid` from
/// the tenant's JWKS endpoint and cached.
pub struct EntraTokenValidator {
    tenant_id: String,
    client_id: String,
    issuer_v1: String,
    issuer_v2: String,
    validate_audience: bool,
    validate_issuer: bool,
    leeway_secs: u64,
    key_store: KeyStore,
}

impl EntraTokenValidator {
    /// Create a validator that fetches signing keys from the tenant's JWKS
    /// endpoint over HTTP
    pub fn new(config: EntraValidatorConfig) -> Self {
        let client = config.http_client.clone().unwrap_or_default();
        let fetcher = Arc::new(HttpKeyFetcher::new(
            client,
            config.jwks_endpoint(),
            config.fetch_timeout,
        ));

        Self::with_key_fetcher(config, fetcher)
    }

    /// Create a validator with a custom key source, e.g. a fake fetcher in
    /// tests
    pub fn with_key_fetcher(config: EntraValidatorConfig, fetcher: Arc<dyn FetchKeys>) -> Self {
        Self {
            issuer_v1: format!("https://sts.windows.net/{}/", config.tenant_id),
            issuer_v2: format!(
                "https://login.microsoftonline.com/{}/v2.0",
                config.tenant_id
            ),
            key_store: KeyStore::new(fetcher, config.max_cached_keys),
            tenant_id: config.tenant_id,
            client_id: config.client_id,
            validate_audience: config.validate_audience,
            validate_issuer: config.validate_issuer,
            leeway_secs: config.leeway_secs,
        }
    }

    /// Decode the token, resolve its signing key and verify signature and
    /// time claims. Nothing in the payload is trusted before this returns.
    async fn verify_signature(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(Error::KeyIdMissing)?;

        // The allow-list is fixed; the header names an algorithm only so we
        // can refuse it, never to choose the verification scheme.
        if header.alg != Algorithm::RS256 {
            return Err(Error::AlgorithmNotAllowed {
                presented: format!("{:?}", header.alg),
                allowed: vec!["RS256".to_string()],
            });
        }

        debug!(kid = %kid, tenant = %self.tenant_id, "Resolving signing key");
        let decoding_key = self.key_store.get_or_fetch(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Audience and issuer are validated manually afterwards: either of
        // two known-good literals is acceptable, which the library's single
        // expected value cannot express.
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        check_issued_at(&token_data.claims, self.leeway_secs)?;

        Ok(token_data.claims)
    }

    /// Validate issuer, audience, tenant binding and mandatory claims
    fn check_policy(&self, claims: &Claims) -> Result<()> {
        if self.validate_audience {
            let prefixed = format!("api://{}", self.client_id);
            let presented = claims.audiences();

            if !presented
                .iter()
                .any(|aud| *aud == self.client_id || *aud == prefixed)
            {
                let got = if presented.is_empty() {
                    "<none>".to_string()
                } else {
                    presented.join(", ")
                };

                return Err(Error::WrongAudience {
                    got,
                    expected: format!("{} or {prefixed}", self.client_id),
                });
            }
        }

        if self.validate_issuer {
            let issuer = claims.issuer().unwrap_or_default();
            if issuer != self.issuer_v1 && issuer != self.issuer_v2 {
                return Err(Error::WrongIssuer(issuer.to_string()));
            }
        }

        // Tenant binding is checked even when issuer validation is off: a
        // signature from shared infrastructure must not let a foreign
        // tenant's token through.
        let tenant = claims.tenant_id().unwrap_or_default();
        if tenant != self.tenant_id {
            return Err(Error::TenantMismatch {
                expected: self.tenant_id.clone(),
                got: tenant.to_string(),
            });
        }

        for claim in ["oid", "tid"] {
            if claims.get(claim).is_none() {
                return Err(Error::MissingClaim(claim.to_string()));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ValidateToken for EntraTokenValidator {
    async fn validate(&self, token: &str, requirement: &Requirement) -> ValidationResult {
        let start = Instant::now();
        let token = strip_bearer(token);

        let claims = match self.verify_signature(token).await {
            Ok(claims) => claims,
            Err(error) => {
                warn!(error = %error, "Token rejected during signature verification");
                return ValidationResult::rejected(&error);
            }
        };

        if let Err(error) = self.check_policy(&claims) {
            warn!(error = %error, user = %claims.principal_hint(), "Token rejected by claim policy");
            return ValidationResult::rejected_with_claims(claims, &error);
        }

        if let Err(error) = evaluate(&claims, requirement) {
            warn!(error = %error, user = %claims.principal_hint(), "Token rejected by authorization requirement");
            return ValidationResult::rejected_with_claims(claims, &error);
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            user = %claims.principal_hint(),
            "Token validated"
        );

        ValidationResult::accepted(claims)
    }
}

/// Validates internal service-to-service tokens signed with a shared secret
///
/// Issuer and audience checks are each enforced only when the configuration
/// names an expected value; there is no tenant concept for internal tokens.
pub struct InternalTokenValidator {
    decoding_key: DecodingKey,
    algorithms: Vec<Algorithm>,
    issuer: Option<String>,
    audience: Option<String>,
    leeway_secs: u64,
    require_exp: bool,
}

impl InternalTokenValidator {
    pub fn new(config: InternalValidatorConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithms: config.algorithms,
            issuer: config.issuer,
            audience: config.audience,
            leeway_secs: config.leeway_secs,
            require_exp: config.require_exp,
        }
    }

    fn verify_signature(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token)?;

        if !self.algorithms.contains(&header.alg) {
            return Err(Error::AlgorithmNotAllowed {
                presented: format!("{:?}", header.alg),
                allowed: self.algorithms.iter().map(|alg| format!("{alg:?}")).collect(),
            });
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = self.algorithms.clone();
        validation.leeway = self.leeway_secs;
        validation.validate_exp = self.require_exp;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.required_spec_claims = if self.require_exp {
            HashSet::from(["exp".to_string()])
        } else {
            HashSet::new()
        };

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        check_issued_at(&token_data.claims, self.leeway_secs)?;

        Ok(token_data.claims)
    }

    fn check_policy(&self, claims: &Claims) -> Result<()> {
        if let Some(expected) = &self.issuer {
            let issuer = claims.issuer().unwrap_or_default();
            if issuer != expected {
                return Err(Error::WrongIssuer(issuer.to_string()));
            }
        }

        if let Some(expected) = &self.audience {
            let presented = claims.audiences();
            if !presented.iter().any(|aud| *aud == expected.as_str()) {
                let got = if presented.is_empty() {
                    "<none>".to_string()
                } else {
                    presented.join(", ")
                };

                return Err(Error::WrongAudience {
                    got,
                    expected: expected.clone(),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ValidateToken for InternalTokenValidator {
    async fn validate(&self, token: &str, requirement: &Requirement) -> ValidationResult {
        let start = Instant::now();
        let token = strip_bearer(token);

        let claims = match self.verify_signature(token) {
            Ok(claims) => claims,
            Err(error) => {
                warn!(error = %error, "Internal token rejected during signature verification");
                return ValidationResult::rejected(&error);
            }
        };

        if let Err(error) = self.check_policy(&claims) {
            warn!(error = %error, user = %claims.principal_hint(), "Internal token rejected by claim policy");
            return ValidationResult::rejected_with_claims(claims, &error);
        }

        if let Err(error) = evaluate(&claims, requirement) {
            warn!(error = %error, user = %claims.principal_hint(), "Internal token rejected by authorization requirement");
            return ValidationResult::rejected_with_claims(claims, &error);
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            user = %claims.principal_hint(),
            "Internal token validated"
        );

        ValidationResult::accepted(claims)
    }
}
