//! Gateway error taxonomy.
//!
//! Every failure that crosses a crate boundary is a [`GatewayError`]. Each
//! variant carries a stable machine-readable code (see [`codes`]) which the
//! GraphQL layer surfaces in the error `extensions`, so clients can branch on
//! `code` without parsing message strings.

use thiserror::Error;

/// Stable error codes surfaced to clients in GraphQL error extensions.
///
/// The two limit codes are emitted by the query governor before execution and
/// have no [`GatewayError`] variant; everything else maps 1:1.
pub mod codes {
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const QUERY_TOO_COMPLEX: &str = "QUERY_TOO_COMPLEX";
    pub const DEPTH_LIMIT_EXCEEDED: &str = "DEPTH_LIMIT_EXCEEDED";
    pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No verified identity on the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// Identity present but not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The addressed entity does not exist upstream.
    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected before any backend call was made.
    #[error("{0}")]
    Validation(String),

    /// The collaborator service could not be reached at the transport level
    /// (connect failure, timeout).
    #[error("{service} service is unavailable: {detail}")]
    UpstreamUnavailable {
        service: &'static str,
        detail: String,
    },

    /// The collaborator answered with a non-success status. `detail` is the
    /// upstream's own error message when it sent one; upstream bodies are
    /// never forwarded beyond that string.
    #[error("{service} service error: {detail}")]
    Upstream {
        service: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Machine-readable code for the GraphQL `extensions.code` field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => codes::UNAUTHENTICATED,
            Self::Forbidden(_) => codes::FORBIDDEN,
            Self::NotFound(_) => codes::NOT_FOUND,
            Self::Validation(_) => codes::VALIDATION_FAILED,
            Self::UpstreamUnavailable { .. } => codes::UPSTREAM_UNAVAILABLE,
            Self::Upstream { .. } => codes::UPSTREAM_ERROR,
            Self::Internal(_) => codes::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a client could reasonably retry the same request unchanged.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    #[must_use]
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("failed to parse response: {e}"))
    }
}
