//! Per-request logging extension.
//!
//! Emits one structured line per executed operation with timing, the
//! operation name, and the authenticated user, plus one line per resolver
//! error so upstream failures surface in the gateway log even when the
//! client swallows them.

use std::{sync::Arc, time::Instant};

use async_graphql::{
    Response,
    extensions::{Extension, ExtensionContext, ExtensionFactory, NextExecute},
};
use vellum_common::RequestContext;

/// Extension factory for request logging.
pub struct RequestLogger;

impl ExtensionFactory for RequestLogger {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(RequestLoggerExtension)
    }
}

struct RequestLoggerExtension;

#[async_trait::async_trait]
impl Extension for RequestLoggerExtension {
    async fn execute(
        &self,
        ctx: &ExtensionContext<'_>,
        operation_name: Option<&str>,
        next: NextExecute<'_>,
    ) -> Response {
        let started = Instant::now();
        let response = next.run(ctx, operation_name).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let operation = operation_name.unwrap_or("anonymous");
        let user = ctx
            .data_opt::<RequestContext>()
            .and_then(RequestContext::user_id)
            .unwrap_or("anonymous");
        let status = if response.errors.is_empty() {
            "success"
        } else {
            "error"
        };
        tracing::info!(
            operation,
            user,
            elapsed_ms,
            status,
            errors = response.errors.len(),
            "graphql request"
        );

        for err in &response.errors {
            tracing::error!(
                operation,
                message = %err.message,
                path = ?err.path,
                extensions = ?err.extensions,
                "graphql error"
            );
        }
        response
    }
}
