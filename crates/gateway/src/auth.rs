//! Bearer token verification.
//!
//! The gateway never issues tokens; the auth service signs HS256 JWTs and
//! this module checks them against the shared secret. A bad token is not a
//! request-level error: it logs a warning and the request proceeds
//! anonymously, so public operations (register, login) keep working.

use {
    jsonwebtoken::{Algorithm, DecodingKey, Validation},
    serde::Deserialize,
    serde_json::Value,
    vellum_common::{AccountRole, RequestContext, User},
};

/// Issuer the auth service stamps into every token.
pub const ISSUER: &str = "deusexmachina-auth";
/// Audience the auth service stamps into every token.
pub const AUDIENCE: &str = "deusexmachina-client";

/// Claims contract shared with the auth service. Unknown claims
/// (`email_verified`, `auth_provider`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

/// Validates bearer tokens and maps their claims onto a [`User`].
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw token (no `Bearer ` scheme) and build the account it
    /// belongs to. Expired or otherwise invalid tokens read as anonymous.
    pub fn verify(&self, token: &str) -> Option<User> {
        match jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Some(User {
                id: data.claims.sub,
                email: data.claims.email,
                display_name: data.claims.display_name,
                role: AccountRole::from_claims(&data.claims.roles),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "invalid auth token");
                None
            },
        }
    }
}

/// Build the per-connection identity for a WebSocket subscription.
///
/// Browsers cannot set headers on a WebSocket upgrade, so the token rides
/// in the `connection_init` payload under `authorization`, with or without
/// the `Bearer ` scheme.
pub fn connection_context(verifier: &TokenVerifier, payload: &Value) -> RequestContext {
    let mut ctx = RequestContext::default();
    if let Some(raw) = payload.get("authorization").and_then(Value::as_str) {
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
        ctx.user = verifier.verify(token);
        ctx.bearer = Some(token.to_owned());
    }
    ctx
}
