//! UCP CLI - Command-line diagnostics for usage-control policies
//!
//! This CLI lets operators inspect how a policy behaves in a scope:
//! - Explain an evaluation as a plan
//! - Show the scope-filtered policy
//! - Evaluate a policy against a set of claims
//! - Validate a policy against the configured bindings and functions

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ucp_engine::EngineConfig;

mod commands;
mod output;

use commands::{evaluate, filter, plan, validate};
use output::OutputFormat;

/// UCP CLI application
#[derive(Parser)]
#[command(name = "ucp")]
#[command(about = "UCP - Usage-control policy diagnostics", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "UCP_CONFIG")]
    config: Option<String>,

    /// Log level, overrides the configured one
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Explain how a policy would be evaluated in a scope
    Plan {
        /// Policy file (JSON)
        #[arg(short, long)]
        policy: String,

        /// Evaluation scope, defaults to the configured one
        #[arg(short, long)]
        scope: Option<String>,

        /// Output format (text, json, yaml)
        #[arg(short, long, default_value = "json")]
        output: OutputFormat,
    },

    /// Print the policy as filtered for a scope
    Filter {
        /// Policy file (JSON)
        #[arg(short, long)]
        policy: String,

        /// Evaluation scope, defaults to the configured one
        #[arg(short, long)]
        scope: Option<String>,
    },

    /// Evaluate a policy; exits non-zero when it is not satisfied
    Evaluate {
        /// Policy file (JSON)
        #[arg(short, long)]
        policy: String,

        /// Evaluation scope, defaults to the configured one
        #[arg(short, long)]
        scope: Option<String>,

        /// Claims of the requesting party (JSON object)
        #[arg(long)]
        claims: Option<String>,

        /// Output format (text, json, yaml)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Check that every rule and constraint can be evaluated somewhere
    Validate {
        /// Policy file (JSON)
        #[arg(short, long)]
        policy: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if cli.json_logs || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let engine = config
        .engine_builder()
        .build()
        .context("failed to build policy engine")?;
    let scope_or_default =
        |scope: Option<String>| scope.unwrap_or_else(|| config.default_scope.clone());

    match cli.command {
        Commands::Plan {
            policy,
            scope,
            output,
        } => plan::execute(&engine, &policy, &scope_or_default(scope), output),
        Commands::Filter { policy, scope } => {
            filter::execute(&engine, &policy, &scope_or_default(scope))
        }
        Commands::Evaluate {
            policy,
            scope,
            claims,
            output,
        } => evaluate::execute(
            &engine,
            &policy,
            &scope_or_default(scope),
            claims.as_deref(),
            output,
        ),
        Commands::Validate { policy } => validate::execute(&engine, &policy),
    }
}
