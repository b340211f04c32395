//! Shared types for the Vellum gateway: the error taxonomy and the caller
//! identity model. Every other crate in the workspace depends on this one,
//! so it stays dependency-light (serde + thiserror only).

pub mod error;
pub mod identity;

pub use {
    error::{GatewayError, GatewayResult, codes},
    identity::{AccountRole, ProjectRole, RequestContext, User},
};
