//! Caller identity: platform roles, project roles, and the per-request
//! context assembled from the verified auth token.

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// Platform-wide account tier carried in the auth token.
///
/// Ordering matters: `Admin` outranks `Premium` outranks `Free`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountRole {
    Free,
    Premium,
    Admin,
}

impl AccountRole {
    /// Collapse the token's `roles` claim into a single tier.
    ///
    /// `admin` wins over `premium`; anything else is `Free`. Unknown role
    /// strings are ignored rather than rejected.
    #[must_use]
    pub fn from_claims(roles: &[String]) -> Self {
        if roles.iter().any(|r| r == "admin") {
            Self::Admin
        } else if roles.iter().any(|r| r == "premium") {
            Self::Premium
        } else {
            Self::Free
        }
    }
}

/// Per-project capability level, ordered weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectRole {
    Viewer,
    Editor,
    Owner,
}

/// The authenticated principal, decoded from the token once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: AccountRole,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }
}

/// Everything the gateway knows about one inbound request.
///
/// Built exactly once when the request (or WebSocket connection) arrives and
/// never mutated afterwards. `bearer` holds the raw token, scheme stripped,
/// so backend calls can rebuild the `Authorization` header.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<User>,
    pub project_id: Option<String>,
    pub bearer: Option<String>,
}

impl RequestContext {
    /// Context with no identity at all. Public operations still work.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The verified user, or `Unauthenticated`.
    pub fn require_user(&self) -> GatewayResult<&User> {
        self.user.as_ref().ok_or(GatewayError::Unauthenticated)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    /// Same identity, rescoped to a different project. Used when an operation
    /// argument names the project explicitly instead of the header.
    #[must_use]
    pub fn with_project(&self, project_id: impl Into<String>) -> Self {
        Self {
            user: self.user.clone(),
            project_id: Some(project_id.into()),
            bearer: self.bearer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn user(role: AccountRole) -> User {
        User {
            id: "u-1".into(),
            email: "ada@example.com".into(),
            display_name: Some("Ada".into()),
            role,
        }
    }

    #[test]
    fn project_roles_are_ordered() {
        assert!(ProjectRole::Viewer < ProjectRole::Editor);
        assert!(ProjectRole::Editor < ProjectRole::Owner);
        assert!(ProjectRole::Owner >= ProjectRole::Viewer);
    }

    #[test]
    fn admin_claim_wins_over_premium() {
        let roles = vec!["premium".to_string(), "admin".to_string()];
        assert_eq!(AccountRole::from_claims(&roles), AccountRole::Admin);
    }

    #[test]
    fn unknown_claims_fall_back_to_free() {
        let roles = vec!["beta-tester".to_string()];
        assert_eq!(AccountRole::from_claims(&roles), AccountRole::Free);
        assert_eq!(AccountRole::from_claims(&[]), AccountRole::Free);
    }

    #[test]
    fn require_user_rejects_anonymous_context() {
        let ctx = RequestContext::anonymous();
        assert!(matches!(
            ctx.require_user(),
            Err(GatewayError::Unauthenticated)
        ));
    }

    #[test]
    fn require_user_returns_the_principal() {
        let ctx = RequestContext {
            user: Some(user(AccountRole::Premium)),
            project_id: Some("p-1".into()),
            bearer: Some("abc".into()),
        };
        let u = ctx.require_user().unwrap();
        assert_eq!(u.id, "u-1");
        assert_eq!(ctx.user_id(), Some("u-1"));
    }

    #[test]
    fn with_project_rescopes_without_touching_identity() {
        let ctx = RequestContext {
            user: Some(user(AccountRole::Free)),
            project_id: Some("p-1".into()),
            bearer: Some("abc".into()),
        };
        let scoped = ctx.with_project("p-2");
        assert_eq!(scoped.project_id.as_deref(), Some("p-2"));
        assert_eq!(scoped.user_id(), Some("u-1"));
        assert_eq!(ctx.project_id.as_deref(), Some("p-1"));
    }

    #[test]
    fn user_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(user(AccountRole::Free)).unwrap();
        assert_eq!(json["displayName"], "Ada");
        assert_eq!(json["role"], "FREE");
    }
}
