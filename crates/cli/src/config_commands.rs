use {
    anyhow::Result,
    clap::Subcommand,
    std::path::Path,
    vellum_config::{
        Severity, VellumConfig, apply_env_overrides, load_config, loader::find_config_file,
        validate,
    },
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(verbose, config_path),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(verbose: bool, config_path: Option<&Path>) -> Result<()> {
    let (mut config, source) = match config_path {
        Some(path) => (load_config(path)?, Some(path.to_path_buf())),
        None => match find_config_file() {
            Some(path) => (load_config(&path)?, Some(path)),
            None => (VellumConfig::default(), None),
        },
    };
    apply_env_overrides(&mut config);

    match source {
        Some(ref path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    print_resolved(&config);

    let result = validate(&config);

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Render the effective configuration, with the signing secret masked.
fn print_resolved(config: &VellumConfig) {
    let mut printable = config.clone();
    if !printable.auth.jwt_secret.is_empty() {
        printable.auth.jwt_secret = "[redacted]".into();
    }
    match toml::to_string_pretty(&printable) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("could not render config: {e}"),
    }
}
