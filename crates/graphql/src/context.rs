//! GraphQL request context bridging to the orchestration layer.

use std::sync::Arc;

use {async_graphql::Context, serde_json::Value, tokio::sync::broadcast};

use vellum_common::RequestContext;

use crate::ops::Ops;

/// Context injected into every GraphQL resolver via `Context::data()`.
///
/// Holds the orchestration layer; resolvers never talk to upstream services
/// or the event bus directly.
pub struct GqlContext {
    pub ops: Arc<Ops>,
}

impl GqlContext {
    /// Subscribe to broadcast events.
    pub fn subscribe(&self) -> broadcast::Receiver<(String, Value)> {
        self.ops.events().subscribe()
    }
}

/// Per-request identity attached by the HTTP layer.
///
/// Requests executed without identity data (tests, direct schema execution)
/// read as anonymous.
pub fn request_context(ctx: &Context<'_>) -> RequestContext {
    ctx.data_opt::<RequestContext>().cloned().unwrap_or_default()
}
