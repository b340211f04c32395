//! REST adapters for the four collaborator services behind the gateway.
//!
//! Each service gets a small trait (`AuthApi`, `DocumentApi`, `MemoryApi`,
//! `GenerationApi`) speaking `serde_json::Value` at the seam; typed decoding
//! happens in the GraphQL layer. [`Backends`] bundles one implementation of
//! each behind `Arc<dyn _>` so tests can swap in recordings.

use std::sync::Arc;

use vellum_common::GatewayResult;
use vellum_config::UpstreamsConfig;

pub mod auth;
pub mod document;
pub mod generation;
pub mod http;
pub mod memory;

pub use {
    auth::{AuthApi, HttpAuthApi},
    document::{DocumentApi, HttpDocumentApi},
    generation::{GenerationApi, GenerationKind, HttpGenerationApi, count_tokens},
    http::{PROJECT_ID_HEADER, ServiceClient, USER_ID_HEADER, build_http_client},
    memory::{HttpMemoryApi, MemoryApi},
};

/// One handle per collaborator service.
#[derive(Clone)]
pub struct Backends {
    pub auth: Arc<dyn AuthApi>,
    pub document: Arc<dyn DocumentApi>,
    pub memory: Arc<dyn MemoryApi>,
    pub generation: Arc<dyn GenerationApi>,
}

impl Backends {
    /// Wire up HTTP adapters from config. All four share one connection pool.
    pub fn from_config(upstreams: &UpstreamsConfig) -> GatewayResult<Self> {
        let http = build_http_client(upstreams.timeout_ms)?;
        Ok(Self {
            auth: Arc::new(HttpAuthApi::new(&upstreams.auth_url, http.clone())),
            document: Arc::new(HttpDocumentApi::new(&upstreams.document_url, http.clone())),
            memory: Arc::new(HttpMemoryApi::new(&upstreams.memory_url, http.clone())),
            generation: Arc::new(HttpGenerationApi::new(&upstreams.ai_url, http)),
        })
    }
}
