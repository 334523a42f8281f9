use std::fmt::Debug;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token missing 'kid' in header")]
    KeyIdMissing,
    #[error("Token algorithm {presented:?} is not allowed. Allowed: {allowed:?}")]
    AlgorithmNotAllowed {
        presented: String,
        allowed: Vec<String>,
    },
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    #[error("Invalid issuer: {0}")]
    WrongIssuer(String),
    #[error("Invalid audience: {got}. Expected: {expected}")]
    WrongAudience { got: String, expected: String },
    #[error("Token from wrong tenant. Expected: {expected}, Got: {got}")]
    TenantMismatch { expected: String, got: String },
    #[error("Missing required claim: {0}")]
    MissingClaim(String),
    #[error("Token has no scopes. Required: {required:?}")]
    NoScopes { required: Vec<String> },
    #[error("Missing required scopes: {missing:?}. Token has: {held:?}")]
    MissingScopes {
        missing: Vec<String>,
        held: Vec<String>,
    },
    #[error("Token missing any of required scopes: {required:?}. Token has: {held:?}")]
    NoMatchingScope {
        required: Vec<String>,
        held: Vec<String>,
    },
    #[error("Token has no roles. Required: {required:?}")]
    NoRoles { required: Vec<String> },
    #[error("Missing required roles: {missing:?}. Token has: {held:?}")]
    MissingRoles {
        missing: Vec<String>,
        held: Vec<String>,
    },
    #[error("Token missing any of required roles: {required:?}. Token has: {held:?}")]
    NoMatchingRole {
        required: Vec<String>,
        held: Vec<String>,
    },
    #[error("Failed to fetch signing keys: {0}")]
    KeyFetch(String),
    #[error("No signing key found for kid '{0}'")]
    KeyNotFound(String),
    #[error(
        "No algorithms configured - at least one allowed algorithm must be configured for security"
    )]
    NoAlgorithmsConfigured,
}

/// Classify errors from the underlying JWT library into this crate's taxonomy
/// so callers can branch on the failing check rather than on library internals.
impl From<jsonwebtoken::errors::Error> for Error {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::ExpiredSignature => Error::TokenExpired,
            ErrorKind::ImmatureSignature => Error::TokenNotYetValid,
            ErrorKind::InvalidSignature => Error::InvalidSignature,
            ErrorKind::MissingRequiredClaim(claim) => Error::MissingClaim(claim.clone()),
            _ => Error::InvalidToken(error.to_string()),
        }
    }
}

pub(crate) fn fetch_jwks_error(error: reqwest::Error) -> Error {
    Error::KeyFetch(format!("Failed to fetch JWKS: {error}"))
}

pub(crate) fn parse_jwks_error(error: reqwest::Error) -> Error {
    Error::KeyFetch(format!("Failed to parse JWKS response: {error}"))
}
