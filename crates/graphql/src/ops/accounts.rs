//! Account operations: registration, sessions, profile lookups.

use serde_json::Value;
use vellum_common::{GatewayResult, RequestContext};

use super::Ops;

impl Ops {
    pub async fn register(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> GatewayResult<Value> {
        self.backends
            .auth
            .register(ctx, email, password, display_name)
            .await
    }

    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> GatewayResult<Value> {
        self.backends.auth.login(ctx, email, password).await
    }

    pub async fn refresh_token(&self, ctx: &RequestContext, token: &str) -> GatewayResult<Value> {
        self.backends.auth.refresh(ctx, token).await
    }

    pub async fn logout(&self, ctx: &RequestContext) -> GatewayResult<Value> {
        ctx.require_user()?;
        self.backends.auth.logout(ctx).await?;
        Ok(Value::Bool(true))
    }

    pub async fn me(&self, ctx: &RequestContext) -> GatewayResult<Value> {
        ctx.require_user()?;
        self.backends.auth.me(ctx).await
    }

    pub async fn user_by_id(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value> {
        ctx.require_user()?;
        self.backends.auth.user_by_id(ctx, id).await
    }
}
