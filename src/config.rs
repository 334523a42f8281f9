use std::time::Duration;

use jsonwebtoken::Algorithm;
use reqwest::Client;

use crate::error::Error;
use crate::error::Result;

const DEFAULT_MAX_CACHED_KEYS: usize = 16;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Configuration for the Entra ID (Azure AD) token validator
#[derive(Debug, Clone)]
pub struct EntraValidatorConfig {
    /// Azure AD tenant ID the tokens must be bound to
    pub(crate) tenant_id: String,
    /// Application (client) ID registered in Azure AD
    pub(crate) client_id: String,
    /// Whether to validate the audience claim (default: true)
    pub(crate) validate_audience: bool,
    /// Whether to validate the issuer claim (default: true)
    pub(crate) validate_issuer: bool,
    /// Leeway in seconds applied to time-based claims (default: 0)
    pub(crate) leeway_secs: u64,
    /// Maximum number of signing keys kept in the LRU cache (default: 16)
    pub(crate) max_cached_keys: usize,
    /// Hard timeout for the outbound JWKS fetch (default: 10s)
    pub(crate) fetch_timeout: Duration,
    /// Override for the JWKS endpoint, e.g. for national clouds or tests.
    /// If not set, the public-cloud discovery URL is derived from the tenant.
    pub(crate) jwks_uri: Option<String>,
    /// Optional custom HTTP client for fetching the key set
    /// If not provided, a default client will be created
    pub(crate) http_client: Option<Client>,
}

impl EntraValidatorConfig {
    /// Create a new configuration for the given tenant and client (application) ID
    pub fn new(tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            validate_audience: true,
            validate_issuer: true,
            leeway_secs: 0,
            max_cached_keys: DEFAULT_MAX_CACHED_KEYS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            jwks_uri: None,
            http_client: None,
        }
    }

    /// Set the leeway in seconds for `exp`/`nbf`/`iat` checks
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Enable or disable audience validation
    pub fn with_audience_validation(mut self, validate: bool) -> Self {
        self.validate_audience = validate;
        self
    }

    /// Enable or disable issuer validation
    pub fn with_issuer_validation(mut self, validate: bool) -> Self {
        self.validate_issuer = validate;
        self
    }

    /// Set the maximum number of signing keys to cache
    pub fn with_max_cached_keys(mut self, max_cached_keys: usize) -> Self {
        self.max_cached_keys = max_cached_keys;
        self
    }

    /// Set the timeout for the outbound JWKS fetch
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Override the JWKS endpoint URL
    pub fn with_jwks_uri(mut self, jwks_uri: impl Into<String>) -> Self {
        self.jwks_uri = Some(jwks_uri.into());
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// The JWKS endpoint tokens for this tenant are verified against
    pub(crate) fn jwks_endpoint(&self) -> String {
        match &self.jwks_uri {
            Some(uri) => uri.clone(),
            None => format!(
                "https://login.microsoftonline.com/{}/discovery/v2.0/keys",
                self.tenant_id
            ),
        }
    }
}

/// Configuration for the internal service-to-service token validator
#[derive(Debug, Clone)]
pub struct InternalValidatorConfig {
    /// Shared secret used to verify the HMAC signature
    pub(crate) secret: String,
    /// Expected issuer; issuer validation is skipped when not set
    pub(crate) issuer: Option<String>,
    /// Expected audience; audience validation is skipped when not set
    pub(crate) audience: Option<String>,
    /// Allowed signing algorithms (default: HS256)
    pub(crate) algorithms: Vec<Algorithm>,
    /// Leeway in seconds applied to time-based claims (default: 0)
    pub(crate) leeway_secs: u64,
    /// Whether tokens must carry an `exp` claim (default: true)
    pub(crate) require_exp: bool,
}

impl InternalValidatorConfig {
    /// Create a new configuration with the given shared secret, allowing HS256 only
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
            algorithms: vec![Algorithm::HS256],
            leeway_secs: 0,
            require_exp: true,
        }
    }

    /// Require the token issuer to equal the given value
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require the token audience to equal the given value
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Replace the algorithm allow-list
    ///
    /// # Errors
    /// Returns `Error::NoAlgorithmsConfigured` if the list is empty
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Result<Self> {
        if algorithms.is_empty() {
            return Err(Error::NoAlgorithmsConfigured);
        }
        self.algorithms = algorithms;
        Ok(self)
    }

    /// Set the leeway in seconds for `exp`/`nbf`/`iat` checks
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Accept tokens without an `exp` claim
    pub fn without_exp_requirement(mut self) -> Self {
        self.require_exp = false;
        self
    }
}
