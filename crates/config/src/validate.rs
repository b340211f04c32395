//! Semantic validation of a loaded configuration.
//!
//! Catches the mistakes that would otherwise surface as a confusing runtime
//! failure: blank upstream URLs, zero limits, the development JWT secret in
//! what looks like a production bind.

use crate::schema::VellumConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "required", "range", "security"
    pub category: &'static str,
    /// Dotted path, e.g. "upstreams.memory_url"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Validate a loaded configuration.
#[must_use]
pub fn validate(config: &VellumConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if config.server.bind.is_empty() {
        diagnostics.push(error("required", "server.bind", "bind address is empty"));
    }
    if config.server.port == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "range",
            path: "server.port".into(),
            message: "port is 0; a random port will be assigned at startup".into(),
        });
    }
    if config.server.allowed_origins.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "required",
            path: "server.allowed_origins".into(),
            message: "no allowed origins configured; browser clients will be blocked by CORS"
                .into(),
        });
    }

    if config.auth.jwt_secret.is_empty() {
        diagnostics.push(error(
            "required",
            "auth.jwt_secret",
            "JWT secret is empty; every token would be rejected",
        ));
    } else if config.auth.jwt_secret == "development-secret" {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "security",
            path: "auth.jwt_secret".into(),
            message: "using the built-in development secret; set JWT_SECRET in production".into(),
        });
    }

    let upstream_urls = [
        ("upstreams.auth_url", &config.upstreams.auth_url),
        ("upstreams.document_url", &config.upstreams.document_url),
        ("upstreams.memory_url", &config.upstreams.memory_url),
        ("upstreams.ai_url", &config.upstreams.ai_url),
    ];
    for (path, url) in upstream_urls {
        if url.is_empty() {
            diagnostics.push(error("required", path, "upstream URL is empty"));
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "range",
                path: path.into(),
                message: format!("upstream URL \"{url}\" does not start with http:// or https://"),
            });
        }
    }
    if config.upstreams.timeout_ms == 0 {
        diagnostics.push(error(
            "range",
            "upstreams.timeout_ms",
            "upstream timeout is 0; every request would fail immediately",
        ));
    }

    if config.limits.max_depth == 0 {
        diagnostics.push(error(
            "range",
            "limits.max_depth",
            "depth limit is 0; every query would be rejected",
        ));
    }
    if config.limits.max_complexity <= 0.0 {
        diagnostics.push(error(
            "range",
            "limits.max_complexity",
            "complexity limit must be positive",
        ));
    }

    if config.throttle.window_ms == 0 {
        diagnostics.push(error(
            "range",
            "throttle.window_ms",
            "rate limit window is 0",
        ));
    }
    if config.throttle.max_requests == 0 {
        diagnostics.push(error(
            "range",
            "throttle.max_requests",
            "max_requests is 0; every request would be throttled",
        ));
    }

    ValidationResult { diagnostics }
}

fn error(category: &'static str, path: &str, message: &str) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        category,
        path: path.into(),
        message: message.into(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_errors() {
        let result = validate(&VellumConfig::default());
        assert!(
            !result.has_errors(),
            "defaults should validate: {:?}",
            result.diagnostics
        );
    }

    #[test]
    fn default_secret_triggers_security_warning() {
        let result = validate(&VellumConfig::default());
        let warning = result
            .diagnostics
            .iter()
            .find(|d| d.category == "security" && d.path == "auth.jwt_secret");
        assert!(
            warning.is_some(),
            "expected security warning for development secret"
        );
    }

    #[test]
    fn overridden_secret_not_warned() {
        let mut config = VellumConfig::default();
        config.auth.jwt_secret = "a-real-secret".into();
        let result = validate(&config);
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn empty_upstream_url_is_error() {
        let mut config = VellumConfig::default();
        config.upstreams.memory_url = String::new();
        let result = validate(&config);
        assert!(result.has_errors());
        let error = result
            .diagnostics
            .iter()
            .find(|d| d.path == "upstreams.memory_url");
        assert!(error.is_some());
        assert_eq!(error.map(|d| d.severity), Some(Severity::Error));
    }

    #[test]
    fn non_http_upstream_url_warned() {
        let mut config = VellumConfig::default();
        config.upstreams.ai_url = "ai.internal:8083".into();
        let result = validate(&config);
        let warning = result
            .diagnostics
            .iter()
            .find(|d| d.path == "upstreams.ai_url");
        assert_eq!(warning.map(|d| d.severity), Some(Severity::Warning));
    }

    #[test]
    fn zero_limits_are_errors() {
        let mut config = VellumConfig::default();
        config.limits.max_depth = 0;
        config.limits.max_complexity = 0.0;
        let result = validate(&config);
        assert_eq!(result.count(Severity::Error), 2);
    }

    #[test]
    fn zero_throttle_values_are_errors() {
        let mut config = VellumConfig::default();
        config.throttle.window_ms = 0;
        config.throttle.max_requests = 0;
        let result = validate(&config);
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Error), 2);
    }

    #[test]
    fn empty_secret_is_error_not_warning() {
        let mut config = VellumConfig::default();
        config.auth.jwt_secret = String::new();
        let result = validate(&config);
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.path == "auth.jwt_secret");
        assert_eq!(d.map(|d| d.severity), Some(Severity::Error));
    }

    #[test]
    fn port_zero_is_info_only() {
        let mut config = VellumConfig::default();
        config.server.port = 0;
        let result = validate(&config);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Info), 1);
    }
}
