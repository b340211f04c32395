//! Auth service adapter: registration, sessions, and user lookup.

use async_trait::async_trait;
use serde_json::{Value, json};
use vellum_common::{GatewayResult, RequestContext};

use crate::http::ServiceClient;

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/register` with the new account's credentials.
    async fn register(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> GatewayResult<Value>;

    /// `POST /auth/login`, returning tokens plus the user record.
    async fn login(&self, ctx: &RequestContext, email: &str, password: &str)
    -> GatewayResult<Value>;

    /// `POST /auth/refresh`, exchanging a refresh token for a new pair.
    async fn refresh(&self, ctx: &RequestContext, token: &str) -> GatewayResult<Value>;

    /// `POST /auth/logout`, invalidating the caller's session.
    async fn logout(&self, ctx: &RequestContext) -> GatewayResult<Value>;

    /// `GET /auth/me`, the profile behind the presented token.
    async fn me(&self, ctx: &RequestContext) -> GatewayResult<Value>;

    /// `GET /users/{id}`.
    async fn user_by_id(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value>;
}

pub struct HttpAuthApi {
    client: ServiceClient,
}

impl HttpAuthApi {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            client: ServiceClient::new("auth", base_url, http),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn register(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> GatewayResult<Value> {
        self.client
            .post(
                "/auth/register",
                ctx,
                json!({
                    "email": email,
                    "password": password,
                    "displayName": display_name,
                }),
            )
            .await
    }

    async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> GatewayResult<Value> {
        self.client
            .post(
                "/auth/login",
                ctx,
                json!({ "email": email, "password": password }),
            )
            .await
    }

    async fn refresh(&self, ctx: &RequestContext, token: &str) -> GatewayResult<Value> {
        self.client
            .post("/auth/refresh", ctx, json!({ "token": token }))
            .await
    }

    async fn logout(&self, ctx: &RequestContext) -> GatewayResult<Value> {
        self.client.post("/auth/logout", ctx, json!({})).await
    }

    async fn me(&self, ctx: &RequestContext) -> GatewayResult<Value> {
        self.client.get("/auth/me", ctx).await
    }

    async fn user_by_id(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value> {
        self.client.get(&format!("/users/{id}"), ctx).await
    }
}
