//! GraphQL HTTP handlers for the gateway.
//!
//! GraphiQL on GET `/graphql`, query/mutation execution on POST `/graphql`,
//! and WebSocket subscriptions when the GET is an upgrade. Identity arrives
//! from `auth_middleware` for HTTP requests and from the `connection_init`
//! payload for WebSocket connections.

use std::sync::Arc;

use {
    async_graphql::http::GraphiQLSource,
    axum::{
        Extension,
        extract::{FromRequestParts, Request, State, WebSocketUpgrade},
        http::{HeaderMap, header},
        response::{Html, IntoResponse, Response},
    },
};

use vellum_common::RequestContext;

use crate::{auth, server::AppState};

/// Handle GET `/graphql`:
///
/// - Standard HTTP GET: returns GraphiQL.
/// - WebSocket upgrade GET: upgrades to GraphQL subscriptions.
pub async fn graphql_get_handler(State(state): State<AppState>, req: Request) -> impl IntoResponse {
    let (mut parts, _body) = req.into_parts();

    if is_websocket_upgrade_request(&parts.headers) {
        let protocol =
            match async_graphql_axum::GraphQLProtocol::from_request_parts(&mut parts, &()).await {
                Ok(protocol) => protocol,
                Err(status) => return status.into_response(),
            };

        let ws = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(ws) => ws,
            Err(rejection) => return rejection.into_response(),
        };

        return graphql_ws_response(&state, protocol, ws);
    }

    graphiql_response()
}

/// Handle GraphQL queries and mutations.
pub async fn graphql_handler(
    State(state): State<AppState>,
    identity: Option<Extension<RequestContext>>,
    req: async_graphql_axum::GraphQLRequest,
) -> impl IntoResponse {
    let identity = identity.map(|Extension(identity)| identity).unwrap_or_default();
    let request = req.into_inner().data(identity);
    async_graphql_axum::GraphQLResponse::from(state.schema.execute(request).await).into_response()
}

fn graphql_ws_response(
    state: &AppState,
    protocol: async_graphql_axum::GraphQLProtocol,
    ws: WebSocketUpgrade,
) -> Response {
    let schema = state.schema.clone();
    let verifier = Arc::clone(&state.verifier);
    ws.protocols(["graphql-transport-ws", "graphql-ws"])
        .on_upgrade(move |socket| {
            let resp = async_graphql_axum::GraphQLWebSocket::new(socket, schema, protocol)
                .on_connection_init(move |payload| async move {
                    let mut data = async_graphql::Data::default();
                    data.insert(auth::connection_context(&verifier, &payload));
                    Ok(data)
                });
            async move {
                resp.serve().await;
            }
        })
        .into_response()
}

fn graphiql_response() -> Response {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint("/graphql")
            .finish(),
    )
    .into_response()
}

fn is_websocket_upgrade_request(headers: &HeaderMap) -> bool {
    // A proper WS upgrade has Connection: Upgrade AND Upgrade: websocket,
    // but we also accept the presence of Sec-WebSocket-Key as a fallback
    // since some clients (e.g. graphql-ws) may omit the Connection header.
    let has_upgrade_header = headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .any(|t| t.trim().eq_ignore_ascii_case("websocket"))
        })
        .unwrap_or(false);

    has_upgrade_header || headers.contains_key(header::SEC_WEBSOCKET_KEY)
}
