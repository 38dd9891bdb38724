//! `blog-check` command-line entry point.
//!
//! Audits a custom domain pointed at a hosted blog and prints a sectioned
//! report (or JSON with `--json`).

mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use blog_check_core::{AuditConfig, AuditError, AuditOptions, AuditOutcome, AuditService, Capabilities};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status when the run is aborted (bad config, failed self-test).
const EXIT_FATAL: u8 = 1;
/// Exit status under `--strict` when any domain check failed.
const EXIT_CHECK_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "blog-check")]
#[command(about = "Audit a custom domain's DNS, propagation, root forwarding and HTTPS for a hosted blog")]
#[command(version)]
struct Cli {
    /// Domain to audit (overrides the domain in the config file)
    #[arg(short, long)]
    domain: Option<String>,

    /// JSON configuration file [default: <config dir>/blog-check/config.json]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also run traceroute and subdomain enumeration when installed
    #[arg(long)]
    advanced: bool,

    /// Append a dig +trace dump and the raw HTTP responses
    #[arg(long)]
    debug: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when any domain check fails
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli).await;
    if let Err(e) = &result {
        tracing::debug!("Audit aborted: {e:?}");
        if cli.json {
            println!("{}", error_json(e));
        } else {
            eprintln!("{}", render::render_error(e));
        }
    }
    ExitCode::from(exit_code(&result, cli.strict))
}

/// Aborted runs (bad config, failed self-test) are fatal whatever `--strict` says.
fn exit_code(result: &anyhow::Result<AuditOutcome>, strict: bool) -> u8 {
    match result {
        Ok(outcome) => exit_status(*outcome, strict),
        Err(_) => EXIT_FATAL,
    }
}

/// `{"error": {...}}` body printed under `--json` when the run is aborted.
fn error_json(error: &anyhow::Error) -> serde_json::Value {
    let details = error
        .downcast_ref::<AuditError>()
        .and_then(|audit| serde_json::to_value(audit).ok())
        .unwrap_or_else(|| serde_json::json!({ "code": "Error", "details": format!("{error:#}") }));
    serde_json::json!({ "error": details })
}

/// Logs go to stderr so `--json` output stays clean.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "warn,blog_check_core=debug,blog_check=debug",
        _ => "debug,blog_check_core=trace,blog_check=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<AuditOutcome> {
    let config = load_config(cli.domain.as_deref(), cli.config.as_deref(), default_config_path())?;
    tracing::info!("Auditing {} ({} expected records)", config.domain, config.records.len());

    let capabilities = Capabilities::detect();
    let service = AuditService::system(config, capabilities)?;
    let report = service
        .run(&AuditOptions {
            advanced: cli.advanced,
            debug: cli.debug,
        })
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render::render_report(&report));
    }
    Ok(report.outcome())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("blog-check").join("config.json"))
}

/// Resolve the configuration: explicit file, then the default file if present,
/// then built-in defaults. `--domain` always wins over the file's domain.
fn load_config(
    domain: Option<&str>,
    explicit: Option<&Path>,
    default_path: Option<PathBuf>,
) -> anyhow::Result<AuditConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| default_path.filter(|p| p.is_file()));

    let mut config = match &path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            AuditConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => AuditConfig::default(),
    };
    if let Some(domain) = domain {
        config.domain = domain.to_string();
    }
    if config.domain.trim().is_empty() {
        return Err(AuditError::InvalidConfig(
            "no domain given; pass --domain or set \"domain\" in the config file".to_string(),
        )
        .into());
    }
    Ok(config.validate()?)
}

/// Configuration problems only change the exit status under `--strict`.
const fn exit_status(outcome: AuditOutcome, strict: bool) -> u8 {
    match outcome {
        AuditOutcome::Failures if strict => EXIT_CHECK_FAILED,
        _ => 0,
    }
}
