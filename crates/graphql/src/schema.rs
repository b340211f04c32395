//! Schema construction and type alias.

use std::sync::Arc;

use async_graphql::Schema;

use crate::{
    context::GqlContext,
    limits::{GovernorLimits, QueryGovernor},
    mutations::MutationRoot,
    ops::Ops,
    queries::QueryRoot,
    subscriptions::SubscriptionRoot,
    telemetry::RequestLogger,
};

/// The full Vellum GraphQL schema type.
pub type VellumSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the GraphQL schema around an orchestration handle.
///
/// `ops` carries the service adapters, the event bus, and the task spawner;
/// resolvers reach all three through it. Per-request identity is attached by
/// the HTTP layer as request data, so nothing request-scoped lives here.
pub fn build_schema(ops: Arc<Ops>, limits: GovernorLimits) -> VellumSchema {
    let ctx = Arc::new(GqlContext { ops });

    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(ctx)
        .extension(QueryGovernor::new(limits))
        .extension(RequestLogger)
        .finish()
}
