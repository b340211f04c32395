use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::VellumConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["vellum.toml", "vellum.yaml", "vellum.yml", "vellum.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<VellumConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./vellum.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/vellum/vellum.{toml,yaml,yml,json}` (user-global)
///
/// Returns `VellumConfig::default()` if no config file is found or the file
/// fails to parse; a broken config must not keep the gateway from starting.
pub fn discover_and_load() -> VellumConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    VellumConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/vellum/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "vellum") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/vellum/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "vellum").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<VellumConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

// ── Environment overrides ───────────────────────────────────────────────────

/// Apply plain environment variables on top of the file config.
///
/// These are the names the platform's deployment manifests already use
/// (`PORT`, `JWT_SECRET`, `*_SERVICE_URL`, ...), so they win over file
/// values. A malformed numeric value logs a warning and keeps the prior
/// value rather than failing startup.
pub fn apply_env_overrides(config: &mut VellumConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(
    config: &mut VellumConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("VELLUM_BIND") {
        config.server.bind = v;
    }
    if let Some(v) = lookup("PORT") {
        parse_override(&mut config.server.port, "PORT", &v);
    }
    if let Some(v) = lookup("ALLOWED_ORIGINS") {
        config.server.allowed_origins = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
    }
    if let Some(v) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = v;
    }
    if let Some(v) = lookup("AUTH_SERVICE_URL") {
        config.upstreams.auth_url = v;
    }
    if let Some(v) = lookup("DOCUMENT_SERVICE_URL") {
        config.upstreams.document_url = v;
    }
    if let Some(v) = lookup("MEMORY_SERVICE_URL") {
        config.upstreams.memory_url = v;
    }
    if let Some(v) = lookup("AI_SERVICE_URL") {
        config.upstreams.ai_url = v;
    }
    if let Some(v) = lookup("UPSTREAM_TIMEOUT_MS") {
        parse_override(&mut config.upstreams.timeout_ms, "UPSTREAM_TIMEOUT_MS", &v);
    }
    if let Some(v) = lookup("GRAPHQL_DEPTH_LIMIT") {
        parse_override(&mut config.limits.max_depth, "GRAPHQL_DEPTH_LIMIT", &v);
    }
    if let Some(v) = lookup("GRAPHQL_COMPLEXITY_LIMIT") {
        parse_override(
            &mut config.limits.max_complexity,
            "GRAPHQL_COMPLEXITY_LIMIT",
            &v,
        );
    }
    if let Some(v) = lookup("RATE_LIMIT_WINDOW_MS") {
        parse_override(&mut config.throttle.window_ms, "RATE_LIMIT_WINDOW_MS", &v);
    }
    if let Some(v) = lookup("RATE_LIMIT_MAX_REQUESTS") {
        parse_override(
            &mut config.throttle.max_requests,
            "RATE_LIMIT_MAX_REQUESTS",
            &v,
        );
    }
}

fn parse_override<T: std::str::FromStr>(slot: &mut T, name: &str, raw: &str)
where
    T::Err: std::fmt::Display,
{
    match raw.parse::<T>() {
        Ok(v) => *slot = v,
        Err(e) => warn!(var = name, value = raw, error = %e, "ignoring unparseable env override"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn loads_toml_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vellum.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 5005

            [upstreams]
            memory_url = "http://memory.internal:9000"
            "#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 5005);
        assert_eq!(cfg.upstreams.memory_url, "http://memory.internal:9000");
        assert_eq!(cfg.upstreams.ai_url, "http://localhost:8083");
    }

    #[test]
    fn loads_json_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vellum.json");
        std::fs::write(&path, r#"{"throttle": {"max_requests": 7}}"#).unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.throttle.max_requests, 7);
        assert_eq!(cfg.throttle.window_ms, 900_000);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vellum.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = VellumConfig::default();
        let vars = [
            ("PORT", "4101"),
            ("JWT_SECRET", "prod-secret"),
            ("AI_SERVICE_URL", "http://ai.internal:8083"),
            ("GRAPHQL_DEPTH_LIMIT", "4"),
            ("GRAPHQL_COMPLEXITY_LIMIT", "250.5"),
            ("ALLOWED_ORIGINS", "https://app.example.com, https://staging.example.com"),
        ];
        apply_env_overrides_with(&mut cfg, lookup_from(&vars));

        assert_eq!(cfg.server.port, 4101);
        assert_eq!(cfg.auth.jwt_secret, "prod-secret");
        assert_eq!(cfg.upstreams.ai_url, "http://ai.internal:8083");
        assert_eq!(cfg.limits.max_depth, 4);
        assert_eq!(cfg.limits.max_complexity, 250.5);
        assert_eq!(
            cfg.server.allowed_origins,
            vec!["https://app.example.com", "https://staging.example.com"]
        );
    }

    #[test]
    fn malformed_numeric_override_keeps_prior_value() {
        let mut cfg = VellumConfig::default();
        let vars = [("PORT", "not-a-port"), ("RATE_LIMIT_WINDOW_MS", "10min")];
        apply_env_overrides_with(&mut cfg, lookup_from(&vars));

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.throttle.window_ms, 900_000);
    }

    #[test]
    fn unset_variables_leave_config_alone() {
        let mut cfg = VellumConfig::default();
        apply_env_overrides_with(&mut cfg, |_| None);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.jwt_secret, "development-secret");
    }
}
