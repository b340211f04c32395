//! Configuration loading, validation, and env substitution.
//!
//! Config files: `vellum.toml`, `vellum.yaml`, or `vellum.json`,
//! searched in `./` then `~/.config/vellum/`. Supports `${ENV_VAR}`
//! substitution in all string values, with plain environment variables
//! (`PORT`, `JWT_SECRET`, `AUTH_SERVICE_URL`, ...) applied on top so the
//! gateway can run configless in a container.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        AuthConfig, LimitsConfig, ServerConfig, ThrottleConfig, UpstreamsConfig, VellumConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
