use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Validated token claims
///
/// A thin wrapper over the raw claim map with typed accessors for the fields
/// this crate reads (issuer, audience, tenant, subject, expiry, scopes, roles)
/// and an escape hatch ([`Claims::get`]) for any additional provider claims.
///
/// Holding a `Claims` value does not by itself imply trust: validators hand
/// out claims on some rejection paths (for example a scope mismatch) so that
/// callers can log what the token actually carried.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Access an arbitrary claim by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The raw claim map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    fn i64_claim(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    fn str_array_claim(&self, name: &str) -> Vec<String> {
        match self.0.get(name) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The issuer (`iss`) claim
    pub fn issuer(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    /// The subject (`sub`) claim
    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    /// The audience (`aud`) claim, normalized to a list
    ///
    /// Entra ID issues a single audience string, but the claim is allowed to
    /// be an array per RFC 7519, so both shapes are accepted.
    pub fn audiences(&self) -> Vec<&str> {
        match self.0.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The tenant (`tid`) claim
    pub fn tenant_id(&self) -> Option<&str> {
        self.str_claim("tid")
    }

    /// The object ID (`oid`) claim identifying the principal in the tenant
    pub fn object_id(&self) -> Option<&str> {
        self.str_claim("oid")
    }

    /// The expiration (`exp`) claim as a Unix timestamp
    pub fn expiry(&self) -> Option<i64> {
        self.i64_claim("exp")
    }

    /// The expiration (`exp`) claim as a UTC datetime
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry().and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// The issued-at (`iat`) claim as a Unix timestamp
    pub fn issued_at(&self) -> Option<i64> {
        self.i64_claim("iat")
    }

    /// The not-before (`nbf`) claim as a Unix timestamp
    pub fn not_before(&self) -> Option<i64> {
        self.i64_claim("nbf")
    }

    /// All scopes carried by the token
    ///
    /// Entra ID delegated-permission tokens carry a space-delimited string in
    /// `scp`; internal tokens carry an array in `scopes`. Both contribute.
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = self
            .str_claim("scp")
            .map(|scp| scp.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        scopes.extend(self.str_array_claim("scopes"));
        scopes
    }

    /// All application roles carried by the token (`roles` array claim)
    pub fn roles(&self) -> Vec<String> {
        self.str_array_claim("roles")
    }

    /// Group object IDs carried by the token (`groups` array claim)
    pub fn groups(&self) -> Vec<String> {
        self.str_array_claim("groups")
    }

    /// Check if the token carries a specific scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().iter().any(|held| held == scope)
    }

    /// Check if the token carries a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|held| held == role)
    }

    /// Check if the token carries at least one of the given scopes
    pub fn has_any_scope(&self, scopes: &[&str]) -> bool {
        let held = self.scopes();
        scopes.iter().any(|scope| held.iter().any(|h| h == scope))
    }

    /// Check if the token carries all of the given scopes
    pub fn has_all_scopes(&self, scopes: &[&str]) -> bool {
        let held = self.scopes();
        scopes.iter().all(|scope| held.iter().any(|h| h == scope))
    }

    /// Best available principal identifier, for logging
    pub(crate) fn principal_hint(&self) -> &str {
        self.str_claim("upn")
            .or_else(|| self.str_claim("unique_name"))
            .or_else(|| self.object_id())
            .or_else(|| self.subject())
            .unwrap_or("<unknown>")
    }

    /// Project the claims into the identity fields downstream user-sync and
    /// session layers consume
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            object_id: self.object_id().map(str::to_string),
            tenant_id: self.tenant_id().map(str::to_string),
            user_principal_name: self
                .str_claim("upn")
                .or_else(|| self.str_claim("unique_name"))
                .map(str::to_string),
            email: self
                .str_claim("email")
                .or_else(|| self.str_claim("preferred_username"))
                .map(str::to_string),
            name: self.str_claim("name").map(str::to_string),
            given_name: self.str_claim("given_name").map(str::to_string),
            family_name: self.str_claim("family_name").map(str::to_string),
            scopes: self.scopes(),
            roles: self.roles(),
            groups: self.groups(),
            app_id: self.str_claim("appid").map(str::to_string),
            app_display_name: self.str_claim("app_displayname").map(str::to_string),
        }
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Identity information projected from validated claims
///
/// This is the contract consumed by downstream persistence/session logic; the
/// crate itself never talks to a user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub object_id: Option<String>,
    pub tenant_id: Option<String>,
    pub user_principal_name: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub scopes: Vec<String>,
    pub roles: Vec<String>,
    pub groups: Vec<String>,
    pub app_id: Option<String>,
    pub app_display_name: Option<String>,
}
