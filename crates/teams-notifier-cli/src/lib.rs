//! # Teams Notifier CLI
//!
//! Operator-facing host for the Teams release notifier.
//!
//! This module provides CLI commands for:
//! - Printing plugin metadata
//! - Validating a plugin configuration file
//! - Executing a hook against a release context, optionally as a dry run

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use teams_notifier::config::validate_config;
use teams_notifier::{
    DeliveryClient, DeliveryConfig, DeliveryError, ExecuteRequest, Hook, ReleaseContext,
    ReleaseContextError, TeamsNotifier,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Structure
// ============================================================================

/// Teams Notifier CLI - release notifications for Microsoft Teams
#[derive(Debug, Parser)]
#[command(name = "teams-notifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Send release notifications to Microsoft Teams")]
pub struct Cli {
    /// Logging level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info", env = "TEAMS_NOTIFIER_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print plugin metadata as JSON
    Info,

    /// Validate a plugin configuration file
    Validate {
        /// JSON or YAML configuration file
        #[arg(short, long, env = "TEAMS_NOTIFIER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Run the notifier for one hook
    Execute {
        /// Lifecycle hook, e.g. post-publish or on-error
        #[arg(long)]
        hook: Hook,

        /// JSON or YAML configuration file
        #[arg(short, long, env = "TEAMS_NOTIFIER_CONFIG")]
        config: Option<PathBuf>,

        /// Release context JSON file, or `-` for stdin
        #[arg(short, long)]
        event: Option<PathBuf>,

        /// Build the card but do not send it
        #[arg(long)]
        dry_run: bool,

        /// Print the card that would be sent
        #[arg(long, requires = "dry_run")]
        print_card: bool,

        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout_secs: u64,
    },
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {message}")]
    InvalidConfigFile { path: PathBuf, message: String },

    #[error("Configuration is invalid ({count} error(s))")]
    InvalidConfiguration { count: usize },

    #[error("Invalid release context: {0}")]
    ReleaseContext(#[from] ReleaseContextError),

    #[error("Delivery setup failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Hook execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ExecutionFailed { .. } => 1,
            CliError::InvalidConfiguration { .. } => 2,
            CliError::InvalidConfigFile { .. } => 3,
            CliError::ReleaseContext(_) => 3,
            CliError::InvalidArgument { .. } => 4,
            CliError::Io { .. } => 5,
            CliError::Delivery(_) => 6,
            CliError::Output(_) => 7,
        }
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Initialize logging based on CLI arguments.
///
/// `RUST_LOG` wins over `--log-level`. Logs go to stderr so stdout stays
/// machine-readable.
pub fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "teams_notifier={level},teams_notifier_cli={level}",
            level = cli.log_level
        ))
        .map_err(|e| CliError::InvalidArgument {
            arg: "log-level".to_string(),
            message: e.to_string(),
        })?,
    };

    let json_layer = cli
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer =
        (!cli.json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| CliError::InvalidArgument {
            arg: "log-level".to_string(),
            message: e.to_string(),
        })
}

/// Run a parsed command.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Info => execute_info_command(),
        Commands::Validate { config } => execute_validate_command(config.as_deref()),
        Commands::Execute {
            hook,
            config,
            event,
            dry_run,
            print_card,
            timeout_secs,
        } => {
            execute_hook_command(ExecuteOptions {
                hook,
                config,
                event,
                dry_run,
                print_card,
                timeout_secs,
            })
            .await
        }
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn execute_info_command() -> Result<(), CliError> {
    print_json(&TeamsNotifier::info())
}

fn execute_validate_command(config: Option<&Path>) -> Result<(), CliError> {
    let raw = config.map(load_plugin_config).transpose()?;

    let response = validate_config(raw.as_ref());
    print_json(&response)?;

    if response.valid {
        info!("Configuration is valid");
        Ok(())
    } else {
        warn!(error_count = response.errors.len(), "Configuration is invalid");
        Err(CliError::InvalidConfiguration {
            count: response.errors.len(),
        })
    }
}

/// Arguments of the `execute` command.
#[derive(Debug)]
struct ExecuteOptions {
    hook: Hook,
    config: Option<PathBuf>,
    event: Option<PathBuf>,
    dry_run: bool,
    print_card: bool,
    timeout_secs: u64,
}

async fn execute_hook_command(options: ExecuteOptions) -> Result<(), CliError> {
    if options.timeout_secs == 0 {
        return Err(CliError::InvalidArgument {
            arg: "timeout-secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let context = match options.event.as_deref() {
        Some(path) => load_release_context(path)?,
        None => ReleaseContext::default(),
    };

    let mut request = ExecuteRequest::new(options.hook, context).dry_run(options.dry_run);
    if let Some(path) = options.config.as_deref() {
        request = request.config(load_plugin_config(path)?);
    }

    let delivery = DeliveryClient::new(
        &DeliveryConfig::default()
            .with_timeout(std::time::Duration::from_secs(options.timeout_secs)),
    )?;
    let notifier = TeamsNotifier::with_delivery_client(delivery);

    if options.print_card {
        match notifier.preview(&request) {
            Some(message) => print_json(&message)?,
            None => info!(hook = %options.hook, "No card for this hook"),
        }
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling delivery");
            interrupt.cancel();
        }
    });

    let response = notifier.execute(&request, &cancel).await;
    signal_task.abort();

    print_json(&response)?;

    if response.success {
        Ok(())
    } else {
        Err(CliError::ExecutionFailed {
            message: response.error.unwrap_or_default(),
        })
    }
}

// ============================================================================
// Input Loading
// ============================================================================

/// Load a plugin configuration map from a JSON or YAML file.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML; everything else as
/// JSON. The document must be a mapping.
pub fn load_plugin_config(path: &Path) -> Result<Map<String, Value>, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let invalid = |message: String| CliError::InvalidConfigFile {
        path: path.to_path_buf(),
        message,
    };

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    let value: Value = if is_yaml {
        serde_yaml::from_str(&contents).map_err(|e| invalid(e.to_string()))?
    } else {
        serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(invalid("expected a mapping of configuration keys".to_string())),
    }
}

/// Load a release context from a JSON file, or from stdin when `path` is `-`.
pub fn load_release_context(path: &Path) -> Result<ReleaseContext, CliError> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?
    };

    Ok(ReleaseContext::from_json(&contents)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
