//! Identity extraction for `/graphql`.
//!
//! Builds the per-request [`RequestContext`] exactly once, before GraphQL
//! runs, and stows it in the request extensions for the handler to attach.
//! Only header *shape* is policed here; whether a token is valid is decided
//! by [`crate::auth::TokenVerifier`], and whether an operation needs a user
//! at all is decided per-field inside the schema.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use vellum_common::RequestContext;

use crate::{auth::TokenVerifier, server::AppState};

/// Header naming the project a request operates on.
pub const PROJECT_ID_HEADER: &str = "x-project-id";

/// Middleware for the `/graphql` routes.
///
/// Rejects a present-but-malformed `Authorization` header with 401 and a
/// repeated `X-Project-ID` header with 400; everything else proceeds with
/// the resolved identity attached.
pub async fn attach_identity(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let identity = match resolve_identity(&state.verifier, request.headers()) {
        Ok(identity) => identity,
        Err(rejection) => return rejection,
    };
    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn resolve_identity(
    verifier: &TokenVerifier,
    headers: &HeaderMap,
) -> Result<RequestContext, Response> {
    let mut ctx = RequestContext::default();

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let Some(token) = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Invalid authorization header format" })),
            )
                .into_response());
        };
        ctx.user = verifier.verify(token);
        ctx.bearer = Some(token.to_owned());
    }

    let mut project_values = headers.get_all(PROJECT_ID_HEADER).iter();
    if let Some(value) = project_values.next() {
        let parsed = value.to_str().ok();
        if parsed.is_none() || project_values.next().is_some() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid X-Project-ID header" })),
            )
                .into_response());
        }
        ctx.project_id = parsed.map(str::to_owned);
    }

    Ok(ctx)
}
