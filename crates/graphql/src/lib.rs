//! GraphQL API for Vellum.
//!
//! Provides the typed schema a writing client talks to: queries over
//! documents and story memory, mutations that edit and generate, and
//! subscriptions for live collaboration. The schema is served at `/graphql`
//! (GraphiQL on GET, queries on POST, subscriptions via WebSocket upgrade
//! on GET).
//!
//! The gateway crate is responsible for building the HTTP handlers and
//! wiring them into the router. This crate only defines the schema, types,
//! resolvers, and the orchestration layer they call.

pub mod context;
pub mod error;
pub mod events;
pub mod inputs;
pub mod limits;
pub mod mutations;
pub mod ops;
pub mod queries;
pub mod scalars;
pub mod schema;
pub mod spawn;
pub mod subscriptions;
pub mod telemetry;
pub mod types;

pub use schema::{VellumSchema, build_schema};

// ── Shared resolver macros ──────────────────────────────────────────────────

/// Pull the orchestration handle and the caller's identity out of resolver
/// context.
#[macro_export]
macro_rules! ops {
    ($ctx:expr) => {{
        let c = $ctx.data::<std::sync::Arc<$crate::context::GqlContext>>()?;
        let identity = $crate::context::request_context($ctx);
        (std::sync::Arc::clone(&c.ops), identity)
    }};
}
