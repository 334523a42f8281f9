use crate::claims::Claims;
use crate::error::Error;
use crate::error::Result;

/// A caller-supplied authorization requirement, evaluated against the claims
/// of an already-verified token
///
/// Scope and role requirements each default to "any of" semantics; the
/// `require_all_*` builders switch to "all of". Scopes are evaluated before
/// roles and the first failing check wins.
#[derive(Debug, Clone, Default)]
pub struct Requirement {
    pub required_scopes: Option<Vec<String>>,
    pub required_roles: Option<Vec<String>>,
    pub require_all_scopes: bool,
    pub require_all_roles: bool,
}

impl Requirement {
    /// A requirement that always passes (authentication only)
    pub fn none() -> Self {
        Self::default()
    }

    /// Require the given scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Require the given roles
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Require every listed scope instead of at least one
    pub fn require_all_scopes(mut self) -> Self {
        self.require_all_scopes = true;
        self
    }

    /// Require every listed role instead of at least one
    pub fn require_all_roles(mut self) -> Self {
        self.require_all_roles = true;
        self
    }
}

/// Evaluate an authorization requirement against validated claims
///
/// Returns the first failing check: scopes before roles. A token whose scope
/// or role claim is entirely absent fails with a different error than one
/// whose claim is present but insufficient, so operators can tell the two
/// apart in logs.
pub fn evaluate(claims: &Claims, requirement: &Requirement) -> Result<()> {
    if let Some(required) = requirement.required_scopes.as_deref() {
        if !required.is_empty() {
            check_scopes(claims, required, requirement.require_all_scopes)?;
        }
    }

    if let Some(required) = requirement.required_roles.as_deref() {
        if !required.is_empty() {
            check_roles(claims, required, requirement.require_all_roles)?;
        }
    }

    Ok(())
}

fn check_scopes(claims: &Claims, required: &[String], require_all: bool) -> Result<()> {
    let held = claims.scopes();

    if held.is_empty() {
        return Err(Error::NoScopes {
            required: required.to_vec(),
        });
    }

    if require_all {
        let missing: Vec<String> = required
            .iter()
            .filter(|scope| !held.contains(*scope))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(Error::MissingScopes { missing, held });
        }
    } else if !required.iter().any(|scope| held.contains(scope)) {
        return Err(Error::NoMatchingScope {
            required: required.to_vec(),
            held,
        });
    }

    Ok(())
}

fn check_roles(claims: &Claims, required: &[String], require_all: bool) -> Result<()> {
    let held = claims.roles();

    if held.is_empty() {
        return Err(Error::NoRoles {
            required: required.to_vec(),
        });
    }

    if require_all {
        let missing: Vec<String> = required
            .iter()
            .filter(|role| !held.contains(*role))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(Error::MissingRoles { missing, held });
        }
    } else if !required.iter().any(|role| held.contains(role)) {
        return Err(Error::NoMatchingRole {
            required: required.to_vec(),
            held,
        });
    }

    Ok(())
}
