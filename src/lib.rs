//! # entra-auth
//!
//! A Rust library for validating bearer tokens issued by Microsoft Entra ID
//! (Azure AD) and by an internal shared-secret issuer, with JWKS signing-key
//! caching and scope/role based authorization.
//!
//! ## Features
//!
//! - RS256 signature verification against the tenant's published JWKS, with
//!   an LRU-bounded per-`kid` key cache that refetches on unknown key IDs
//! - Acceptance of both v1.0 (`sts.windows.net`) and v2.0
//!   (`login.microsoftonline.com`) issuer URLs for the same tenant
//! - Acceptance of both audience conventions: the bare client ID and its
//!   `api://` resource-URI form
//! - Tenant binding and mandatory-claim checks (`oid`, `tid`)
//! - Scope and role requirements with any/all semantics
//! - A symmetric-key validator for internal service-to-service tokens behind
//!   the same [`ValidateToken`] contract
//!
//! ## Example
//!
//! ```rust,no_run
//! use entra_auth::{EntraTokenValidator, EntraValidatorConfig, Requirement, ValidateToken};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EntraValidatorConfig::new("your-tenant-id", "your-client-id")
//!         .with_leeway(30);
//!     let validator = EntraTokenValidator::new(config);
//!
//!     let requirement = Requirement::none().with_scopes(["User.Read"]);
//!
//!     let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
//!     let result = validator.validate(token, &requirement).await;
//!
//!     if result.is_valid {
//!         let claims = result.claims.expect("accepted tokens carry claims");
//!         println!("User: {:?}", claims.user_info().user_principal_name);
//!     } else {
//!         eprintln!("Rejected: {}", result.error.unwrap_or_default());
//!     }
//! }
//! ```

mod access;
mod claims;
mod config;
mod error;
mod jwks;
mod validator;

// Re-exports for public API
pub use access::evaluate;
pub use access::Requirement;
pub use claims::Claims;
pub use claims::UserInfo;
pub use config::EntraValidatorConfig;
pub use config::InternalValidatorConfig;
pub use error::Error;
pub use error::Result;
pub use jwks::FetchKeys;
pub use jwks::HttpKeyFetcher;
pub use jwks::KeyStore;
pub use validator::strip_bearer;
pub use validator::EntraTokenValidator;
pub use validator::InternalTokenValidator;
pub use validator::ValidateToken;
pub use validator::ValidationResult;
