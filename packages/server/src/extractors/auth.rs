use std::collections::{HashMap, HashSet};

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::config::PrincipalEntry;
use crate::error::AppError;
use crate::state::AppState;

/// External authorization collaborator.
///
/// The core never inspects sessions or tokens itself; it asks this interface
/// who the caller is and whether they carry the admin capability, and passes
/// the answer into handlers as an explicit principal.
pub trait Authorizer: Send + Sync {
    /// Resolve a bearer token to a principal id; `None` when unauthenticated.
    fn current_principal(&self, token: &str) -> Option<String>;

    /// Whether the principal carries the admin capability.
    fn is_admin(&self, principal_id: &str) -> bool;
}

/// Token table sourced from configuration.
pub struct StaticAuthorizer {
    by_token: HashMap<String, String>,
    admins: HashSet<String>,
}

impl StaticAuthorizer {
    pub fn from_entries(entries: &[PrincipalEntry]) -> Self {
        let mut by_token = HashMap::with_capacity(entries.len());
        let mut admins = HashSet::new();
        for entry in entries {
            by_token.insert(entry.token.clone(), entry.id.clone());
            if entry.admin {
                admins.insert(entry.id.clone());
            }
        }
        Self { by_token, admins }
    }
}

impl Authorizer for StaticAuthorizer {
    fn current_principal(&self, token: &str) -> Option<String> {
        self.by_token.get(token).cloned()
    }

    fn is_admin(&self, principal_id: &str) -> bool {
        self.admins.contains(principal_id)
    }
}

/// Authenticated principal extracted from the `Authorization: Bearer <token>`
/// header via the authorization collaborator.
///
/// Add this as a handler parameter to require authentication; call
/// `require_admin()` in the handler body for admin-only operations.
pub struct AuthPrincipal {
    pub id: String,
    pub is_admin: bool,
}

impl AuthPrincipal {
    /// Returns `Ok(())` if the principal is an admin, `Err(PermissionDenied)`
    /// otherwise.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let id = state
            .authorizer
            .current_principal(token)
            .ok_or(AppError::TokenInvalid)?;
        let is_admin = state.authorizer.is_admin(&id);

        Ok(AuthPrincipal { id, is_admin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorizer() -> StaticAuthorizer {
        StaticAuthorizer::from_entries(&[
            PrincipalEntry {
                token: "admin-token".into(),
                id: "admin-1".into(),
                admin: true,
            },
            PrincipalEntry {
                token: "user-token".into(),
                id: "user-1".into(),
                admin: false,
            },
        ])
    }

    #[test]
    fn resolves_known_tokens() {
        let auth = authorizer();
        assert_eq!(
            auth.current_principal("admin-token").as_deref(),
            Some("admin-1")
        );
        assert_eq!(auth.current_principal("bogus"), None);
    }

    #[test]
    fn admin_flag_follows_config() {
        let auth = authorizer();
        assert!(auth.is_admin("admin-1"));
        assert!(!auth.is_admin("user-1"));
        assert!(!auth.is_admin("unknown"));
    }

    #[test]
    fn require_admin_gates_non_admins() {
        let principal = AuthPrincipal {
            id: "user-1".into(),
            is_admin: false,
        };
        assert!(matches!(
            principal.require_admin(),
            Err(AppError::PermissionDenied)
        ));
    }
}
