//! Endpoint-Scraper main entry point
//!
//! This is the command-line interface: serve configured endpoints over HTTP,
//! run one endpoint once, or check a definitions file.

use clap::{Parser, Subcommand};
use endpoint_scraper::config::{load_endpoints, ClientConfig, EndpointRegistry, ReloadOutcome};
use endpoint_scraper::endpoint::{build_http_client, ParamSet};
use endpoint_scraper::server::{render_records, serve};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Endpoint-Scraper: declarative HTML extraction behind HTTP endpoints
///
/// Each configured endpoint renders a request template, fetches the page and
/// extracts fields with selector/attribute/regex chains.
#[derive(Parser, Debug)]
#[command(name = "endpoint-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Declarative HTML extraction behind HTTP endpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Whole-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    connect_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve every endpoint in CONFIG, reloading it on SIGHUP
    Serve {
        /// Path to the JSON or TOML endpoint definitions
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Listening interface
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Listening port
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },

    /// Execute one endpoint once and print its records as JSON
    Run {
        /// Path to the JSON or TOML endpoint definitions
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Request path the endpoint is configured under
        #[arg(value_name = "PATH")]
        path: String,

        /// Template parameter as name=value (repeatable)
        #[arg(short, long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Load and compile CONFIG, report every endpoint and failure
    Check {
        /// Path to the JSON or TOML endpoint definitions
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let client_config = ClientConfig {
        timeout_secs: cli.timeout,
        connect_timeout_secs: cli.connect_timeout,
    };

    match cli.command {
        Command::Serve { config, host, port } => {
            handle_serve(&config, &host, port, &client_config).await
        }
        Command::Run {
            config,
            path,
            params,
        } => handle_run(&config, &path, params.into_iter().collect(), &client_config).await,
        Command::Check { config } => handle_check(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("endpoint_scraper=info,warn"),
            1 => EnvFilter::new("endpoint_scraper=debug,info"),
            2 => EnvFilter::new("endpoint_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))
}

/// Handles `serve`: load, listen, reload on SIGHUP
async fn handle_serve(
    config: &Path,
    host: &str,
    port: u16,
    client_config: &ClientConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Loading endpoints from: {}", config.display());
    let registry = Arc::new(EndpointRegistry::default());
    match registry.reload_from(config) {
        Ok(outcome) => log_outcome(&outcome),
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    }

    spawn_reload_on_hangup(Arc::clone(&registry), config.to_path_buf());

    let client = build_http_client(client_config)?;
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    serve(addr, registry, client).await?;
    Ok(())
}

#[cfg(unix)]
fn spawn_reload_on_hangup(registry: Arc<EndpointRegistry>, config: PathBuf) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("SIGHUP reload unavailable: {}", e);
                return;
            }
        };

        while hangups.recv().await.is_some() {
            match registry.reload_from(&config) {
                Ok(outcome) => log_outcome(&outcome),
                Err(e) => tracing::error!("Failed to reload configuration: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_registry: Arc<EndpointRegistry>, _config: PathBuf) {
    tracing::warn!("SIGHUP reload is only available on unix");
}

fn log_outcome(outcome: &ReloadOutcome) {
    match outcome {
        ReloadOutcome::Unchanged => tracing::info!("Configuration unchanged"),
        ReloadOutcome::Reloaded {
            endpoints,
            failures,
        } => {
            tracing::info!("Successfully loaded {} endpoints", endpoints);
            for failure in failures {
                tracing::error!("Skipped endpoint {}: {}", failure.path, failure.error);
            }
        }
    }
}

/// Handles `run`: execute one endpoint and print the result
async fn handle_run(
    config: &Path,
    path: &str,
    params: ParamSet,
    client_config: &ClientConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_endpoints(config)?;
    let endpoint = match loaded.endpoints.get(path) {
        Some(endpoint) => endpoint,
        None => {
            if let Some(failure) = loaded.failures.iter().find(|f| f.path == path) {
                return Err(format!("endpoint {} failed to load: {}", path, failure.error).into());
            }
            return Err(format!("no endpoint configured at {}", path).into());
        }
    };

    let client = build_http_client(client_config)?;
    let records = endpoint.execute(&client, &params).await?;
    tracing::info!("{} => {} records", path, records.len());

    let output = render_records(records, endpoint.is_list());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Handles `check`: report what the definitions file compiles to
fn handle_check(config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_endpoints(config)?;

    println!("=== Endpoint Check ===\n");
    println!("Config: {}", config.display());
    println!("Hash: {}\n", loaded.endpoints.hash());

    println!("Endpoints ({}):", loaded.endpoints.len());
    for (path, endpoint) in loaded.endpoints.iter() {
        let mode = match &endpoint.list {
            Some(list) => format!("list '{}'", list.source()),
            None => "single".to_string(),
        };
        println!(
            "  - {} [{} {}] {}",
            path,
            endpoint.effective_method(),
            endpoint.url,
            mode
        );
        for (field, chain) in &endpoint.fields {
            println!("    * {}: {}", field, chain.source());
        }
    }

    if loaded.failures.is_empty() {
        println!("\n✓ All endpoints compiled");
        return Ok(());
    }

    println!("\nFailures ({}):", loaded.failures.len());
    for failure in &loaded.failures {
        println!("  - {}: {}", failure.path, failure.error);
    }
    Err(format!("{} endpoints failed to compile", loaded.failures.len()).into())
}
