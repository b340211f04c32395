//! Config schema types for the gateway (server, auth, upstreams, limits,
//! throttle). Every section is `#[serde(default)]` so a partial file or no
//! file at all yields a runnable configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VellumConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub upstreams: UpstreamsConfig,
    pub limits: LimitsConfig,
    pub throttle: ThrottleConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0" (container-friendly).
    pub bind: String,
    /// Port to listen on. Defaults to 8080 (the Cloud Run convention).
    pub port: u16,
    /// CORS allowlist. Requests from other origins get no CORS headers.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            allowed_origins: vec!["http://localhost:3000".into()],
        }
    }
}

/// Token verification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 shared secret; must match the one the auth service signs with.
    /// The default only exists so local development works out of the box.
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret".into(),
        }
    }
}

/// Base URLs and timeout for the four collaborator services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    pub auth_url: String,
    pub document_url: String,
    pub memory_url: String,
    pub ai_url: String,
    /// Outbound request timeout in milliseconds. Defaults to 30000.
    pub timeout_ms: u64,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            auth_url: "http://localhost:8080".into(),
            document_url: "http://localhost:8080".into(),
            memory_url: "http://localhost:8082".into(),
            ai_url: "http://localhost:8083".into(),
            timeout_ms: 30_000,
        }
    }
}

/// Query governor ceilings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum selection-set nesting depth. Defaults to 10.
    pub max_depth: usize,
    /// Maximum estimated query cost. Defaults to 1000.
    pub max_complexity: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_complexity: 1000.0,
        }
    }
}

/// Fixed-window per-IP rate limiting in front of `/graphql`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Window length in milliseconds. Defaults to 900000 (15 minutes).
    pub window_ms: u64,
    /// Requests allowed per IP per window. Defaults to 100.
    pub max_requests: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window_ms: 900_000,
            max_requests: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = VellumConfig::default();
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(cfg.auth.jwt_secret, "development-secret");
        assert_eq!(cfg.upstreams.auth_url, "http://localhost:8080");
        assert_eq!(cfg.upstreams.memory_url, "http://localhost:8082");
        assert_eq!(cfg.upstreams.ai_url, "http://localhost:8083");
        assert_eq!(cfg.upstreams.timeout_ms, 30_000);
        assert_eq!(cfg.limits.max_depth, 10);
        assert_eq!(cfg.limits.max_complexity, 1000.0);
        assert_eq!(cfg.throttle.window_ms, 900_000);
        assert_eq!(cfg.throttle.max_requests, 100);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: VellumConfig = toml::from_str(
            r#"
            [server]
            port = 8085

            [limits]
            max_depth = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8085);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.limits.max_depth, 6);
        assert_eq!(cfg.limits.max_complexity, 1000.0);
        assert_eq!(cfg.throttle.max_requests, 100);
    }
}
