//! Shared HTTP plumbing for the collaborator services.
//!
//! Every adapter goes through [`ServiceClient`], which owns identity header
//! injection and the mapping from transport/status failures to
//! [`GatewayError`]. Adapters stay thin: they know routes and payload shapes,
//! nothing else.

use std::time::Duration;

use reqwest::{
    Method, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde_json::Value;
use tracing::{debug, warn};
use vellum_common::{GatewayError, GatewayResult, RequestContext};

/// Header carrying the verified user id to collaborator services.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the active project scope.
pub const PROJECT_ID_HEADER: &str = "x-project-id";

/// Build the HTTP client shared by all service adapters.
pub fn build_http_client(timeout_ms: u64) -> GatewayResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))
}

/// A JSON-over-HTTP client bound to one collaborator service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service: &'static str,
    base_url: String,
    client: reqwest::Client,
}

impl ServiceClient {
    pub fn new(service: &'static str, base_url: &str, client: reqwest::Client) -> Self {
        Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub async fn get(&self, path: &str, ctx: &RequestContext) -> GatewayResult<Value> {
        self.dispatch(Method::GET, path, ctx, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        ctx: &RequestContext,
        body: Value,
    ) -> GatewayResult<Value> {
        self.dispatch(Method::POST, path, ctx, Some(body)).await
    }

    pub async fn put(&self, path: &str, ctx: &RequestContext, body: Value) -> GatewayResult<Value> {
        self.dispatch(Method::PUT, path, ctx, Some(body)).await
    }

    pub async fn delete(&self, path: &str, ctx: &RequestContext) -> GatewayResult<Value> {
        self.dispatch(Method::DELETE, path, ctx, None).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        ctx: &RequestContext,
        body: Option<Value>,
    ) -> GatewayResult<Value> {
        let url = format!("{}{path}", self.base_url);
        let mut req = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        // Identity propagation: collaborators trust these headers, the
        // gateway is the only thing allowed to set them.
        if let Some(user) = &ctx.user {
            req = req.header(USER_ID_HEADER, &user.id);
            if let Some(token) = &ctx.bearer {
                req = req.header(AUTHORIZATION, format!("Bearer {token}"));
            }
        }
        if let Some(project_id) = &ctx.project_id {
            req = req.header(PROJECT_ID_HEADER, project_id);
        }
        if let Some(body) = &body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(service = self.service, %method, path, error = %e, "request failed");
            GatewayError::UpstreamUnavailable {
                service: self.service,
                detail: e.to_string(),
            }
        })?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable {
                service: self.service,
                detail: e.to_string(),
            })?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        debug!(
            service = self.service,
            %method,
            path,
            status = status.as_u16(),
            "upstream returned an error status"
        );
        let detail = error_detail(&bytes);
        Err(match status {
            StatusCode::UNAUTHORIZED => GatewayError::Unauthenticated,
            StatusCode::FORBIDDEN => {
                GatewayError::Forbidden(detail.unwrap_or_else(|| "Forbidden".to_string()))
            },
            StatusCode::NOT_FOUND => GatewayError::not_found(entity_from_path(path)),
            _ => GatewayError::Upstream {
                service: self.service,
                status: status.as_u16(),
                detail: detail.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("upstream failure")
                        .to_string()
                }),
            },
        })
    }
}

/// Pull the error message out of an upstream error body, if it sent one.
fn error_detail(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    let obj = value.as_object()?;
    obj.get("error")
        .or_else(|| obj.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Human-readable noun for 404 messages, derived from the route shape.
fn entity_from_path(path: &str) -> &'static str {
    let trimmed = path.trim_start_matches('/');
    let mut segments = trimmed.split(['/', '?']);
    match segments.next().unwrap_or_default() {
        "auth" | "users" => "user",
        "document" | "documents" => "document",
        "chapter" => "chapter",
        "scene" => "scene",
        "generate" => "generation request",
        "memory" => match segments.next().unwrap_or_default() {
            "characters" => "character",
            "plot" => "plot thread",
            "world" => "world memory",
            "context" => "story context",
            _ => "memory record",
        },
        _ => "resource",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use mockito::Matcher;
    use serde_json::json;
    use vellum_common::{AccountRole, User};

    use super::*;

    fn authed_ctx() -> RequestContext {
        RequestContext {
            user: Some(User {
                id: "user-1".into(),
                email: "ada@example.com".into(),
                display_name: Some("Ada".into()),
                role: AccountRole::Free,
            }),
            project_id: Some("proj-1".into()),
            bearer: Some("tok-abc".into()),
        }
    }

    #[tokio::test]
    async fn forwards_identity_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/document/d1")
            .match_header("x-user-id", "user-1")
            .match_header("authorization", "Bearer tok-abc")
            .match_header("x-project-id", "proj-1")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"id":"d1"}"#)
            .create_async()
            .await;

        let client = ServiceClient::new("document", &server.url(), reqwest::Client::new());
        let value = client.get("/document/d1", &authed_ctx()).await.unwrap();
        assert_eq!(value["id"], "d1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn anonymous_requests_carry_no_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/document/d1")
            .match_header("x-user-id", Matcher::Missing)
            .match_header("authorization", Matcher::Missing)
            .match_header("x-project-id", Matcher::Missing)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = ServiceClient::new("document", &server.url(), reqwest::Client::new());
        client
            .get("/document/d1", &RequestContext::anonymous())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn posts_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/document")
            .match_body(Matcher::Json(json!({"title": "Nightfall"})))
            .with_status(200)
            .with_body(r#"{"id":"d2","title":"Nightfall"}"#)
            .create_async()
            .await;

        let client = ServiceClient::new("document", &server.url(), reqwest::Client::new());
        let value = client
            .post("/document", &authed_ctx(), json!({"title": "Nightfall"}))
            .await
            .unwrap();
        assert_eq!(value["title"], "Nightfall");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_success_body_becomes_null() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/document/d1")
            .with_status(204)
            .create_async()
            .await;

        let client = ServiceClient::new("document", &server.url(), reqwest::Client::new());
        let value = client.delete("/document/d1", &authed_ctx()).await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn maps_401_to_unauthenticated() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/me")
            .with_status(401)
            .with_body(r#"{"error":"token expired"}"#)
            .create_async()
            .await;

        let client = ServiceClient::new("auth", &server.url(), reqwest::Client::new());
        let err = client
            .get("/auth/me", &RequestContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthenticated));
    }

    #[tokio::test]
    async fn maps_403_to_forbidden_with_upstream_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/document/d1")
            .with_status(403)
            .with_body(r#"{"error":"viewer role cannot edit"}"#)
            .create_async()
            .await;

        let client = ServiceClient::new("document", &server.url(), reqwest::Client::new());
        let err = client
            .put("/document/d1", &authed_ctx(), json!({}))
            .await
            .unwrap_err();
        match err {
            GatewayError::Forbidden(msg) => assert_eq!(msg, "viewer role cannot edit"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_404_to_not_found_with_route_noun() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/scene/d1/1/9")
            .with_status(404)
            .create_async()
            .await;

        let client = ServiceClient::new("document", &server.url(), reqwest::Client::new());
        let err = client
            .get("/scene/d1/1/9", &authed_ctx())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "scene not found");
    }

    #[tokio::test]
    async fn maps_other_statuses_to_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate/text")
            .with_status(502)
            .with_body(r#"{"message":"model overloaded"}"#)
            .create_async()
            .await;

        let client = ServiceClient::new("ai", &server.url(), reqwest::Client::new());
        let err = client
            .post("/generate/text", &authed_ctx(), json!({}))
            .await
            .unwrap_err();
        match err {
            GatewayError::Upstream {
                service,
                status,
                detail,
            } => {
                assert_eq!(service, "ai");
                assert_eq!(status, 502);
                assert_eq!(detail, "model overloaded");
            },
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_unavailable() {
        // Nothing listens on port 1.
        let client = ServiceClient::new("memory", "http://127.0.0.1:1", reqwest::Client::new());
        let err = client
            .get("/memory/characters", &authed_ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable { .. }));
        assert!(err.retryable());
    }

    #[test]
    fn route_nouns_cover_the_service_surface() {
        assert_eq!(entity_from_path("/users/u1"), "user");
        assert_eq!(entity_from_path("/document/d1"), "document");
        assert_eq!(entity_from_path("/chapter/d1/2"), "chapter");
        assert_eq!(entity_from_path("/memory/characters/c1"), "character");
        assert_eq!(entity_from_path("/memory/plot/p1/t1"), "plot thread");
        assert_eq!(entity_from_path("/memory/world/p1"), "world memory");
        assert_eq!(
            entity_from_path("/memory/context/p1/s1?chapter=1&scene=2"),
            "story context"
        );
        assert_eq!(entity_from_path("/somewhere/else"), "resource");
    }
}
