//! Gateway: the HTTP/WebSocket surface in front of the GraphQL schema.
//!
//! Lifecycle:
//! 1. Load + validate config
//! 2. Wire upstream adapters, event bus, schema, token verifier
//! 3. Bind and serve `/graphql` (GraphiQL on GET, execution on POST,
//!    subscriptions via WebSocket upgrade), `/health`, `/`
//! 4. Drain connections on SIGTERM/SIGINT
//!
//! Domain logic lives in `vellum-graphql`; this crate owns transport
//! concerns only: identity extraction, CORS, rate limiting, the router.

pub mod auth;
pub mod auth_middleware;
pub mod graphql_routes;
pub mod request_throttle;
pub mod server;
