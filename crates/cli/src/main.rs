mod config_commands;

use {
    clap::{Parser, Subcommand},
    std::path::Path,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    vellum_config::{Severity, VellumConfig, apply_env_overrides, discover_and_load, load_config},
};

#[derive(Parser)]
#[command(name = "vellum", about = "GraphQL gateway for the Vellum writing platform")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    // Gateway arguments (used when no subcommand is provided, or with `serve`)
    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Explicit config file (skips the ./vellum.* and ~/.config/vellum/ search).
    #[arg(long, global = true, env = "VELLUM_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default when no subcommand is provided).
    Serve,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Initialise tracing from `RUST_LOG` when set, else the `--log-level` flag.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Effective configuration: an explicit `--config` path, else the usual
/// discovery chain, with environment overrides applied on top.
fn resolve_config(path: Option<&Path>) -> anyhow::Result<VellumConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "vellum starting");

    match cli.command {
        // Default: start the gateway when no subcommand is provided.
        None | Some(Commands::Serve) => {
            let mut config = resolve_config(cli.config.as_deref())?;

            // CLI args override config values.
            if let Some(bind) = cli.bind {
                config.server.bind = bind;
            }
            if let Some(port) = cli.port {
                config.server.port = port;
            }

            // Validation problems are logged but never block startup; an
            // env-only container run must still come up.
            for d in vellum_config::validate(&config).diagnostics {
                match d.severity {
                    Severity::Error => error!(path = %d.path, "config: {}", d.message),
                    Severity::Warning => warn!(path = %d.path, "config: {}", d.message),
                    Severity::Info => info!(path = %d.path, "config: {}", d.message),
                }
            }

            vellum_gateway::server::start_gateway(&config).await
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
    }
}
