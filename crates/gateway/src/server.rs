use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    axum::{
        Router,
        http::{HeaderName, Method, header},
        response::{IntoResponse, Json},
        routing::get,
    },
    tower_http::cors::{AllowOrigin, CorsLayer},
    tracing::info,
};

use {
    vellum_backends::Backends,
    vellum_config::{ServerConfig, VellumConfig},
    vellum_graphql::{
        VellumSchema, build_schema, events::EventBus, limits::GovernorLimits, ops::Ops,
        spawn::TokioSpawner,
    },
};

use crate::{
    auth::TokenVerifier,
    auth_middleware::{PROJECT_ID_HEADER, attach_identity},
    graphql_routes::{graphql_get_handler, graphql_handler},
    request_throttle::{RequestThrottle, throttle_gate},
};

// ── Shared app state ─────────────────────────────────────────────────────────

/// Cheap-to-clone bundle handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub schema: VellumSchema,
    pub verifier: Arc<TokenVerifier>,
    pub throttle: RequestThrottle,
}

impl AppState {
    /// Wire the full stack from config: HTTP adapters for the collaborator
    /// services, event bus, background spawner, schema, token verifier,
    /// request throttle.
    pub fn from_config(config: &VellumConfig) -> anyhow::Result<Self> {
        let backends = Backends::from_config(&config.upstreams)?;
        Ok(Self::with_backends(config, backends))
    }

    /// Same wiring with injected service adapters. Tests use this to put
    /// recording mocks behind the real HTTP surface.
    pub fn with_backends(config: &VellumConfig, backends: Backends) -> Self {
        let ops = Ops::new(backends, EventBus::default(), Arc::new(TokioSpawner));
        let limits = GovernorLimits {
            max_depth: config.limits.max_depth,
            max_complexity: config.limits.max_complexity,
        };
        Self {
            schema: build_schema(Arc::new(ops), limits),
            verifier: Arc::new(TokenVerifier::new(&config.auth.jwt_secret)),
            throttle: RequestThrottle::new(config.throttle),
        }
    }
}

// ── Router assembly ──────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
///
/// Layering, outermost first: CORS, throttle, then per-route handlers with
/// the identity middleware wrapped around `/graphql` only.
pub fn build_gateway_app(state: AppState, server: &ServerConfig) -> Router {
    let cors = cors_layer(&server.allowed_origins);

    let graphql = Router::new()
        .route("/graphql", get(graphql_get_handler).post(graphql_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            attach_identity,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .merge(graphql)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            throttle_gate,
        ))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(PROJECT_ID_HEADER),
        ])
        .expose_headers([header::AUTHORIZATION])
        .max_age(Duration::from_secs(86_400))
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Start the gateway HTTP server. Runs until SIGTERM/SIGINT.
pub async fn start_gateway(config: &VellumConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let app = build_gateway_app(state, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("GraphQL server ready at http://{addr}/graphql");
    info!("subscriptions ready at ws://{addr}/graphql");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            },
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            },
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received, draining connections");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "vellum-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}

async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "vellum-gateway",
        "graphql": "/graphql",
        "health": "/health",
        "cors_configured": true,
    }))
}
