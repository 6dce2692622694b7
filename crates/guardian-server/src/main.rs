//! Guardian governance audit log server.
//!
//! Usage:
//!   GUARDIAN_GOVERNANCE_KEY=... guardian-server
//!   guardian-server --config guardian.toml --bind-addr 0.0.0.0:8080

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use guardian_server::{
    api, bootstrap,
    config::{ConfigOverrides, ServerConfig},
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Accepts harm-override reports and appends them to the hash-chained
/// governance audit log.
#[derive(Parser)]
#[command(name = "guardian-server", version, about)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(long, env = "GUARDIAN_CONFIG")]
    config: Option<PathBuf>,

    /// Shared secret callers present in `x-governance-key`.
    #[arg(long, env = "GUARDIAN_GOVERNANCE_KEY", hide_env_values = true)]
    governance_key: Option<String>,

    /// Path of the JSON Lines audit log.
    #[arg(long, env = "GUARDIAN_AUDIT_LOG_PATH")]
    audit_log_path: Option<PathBuf>,

    /// Constitution version stamped on every event.
    #[arg(long, env = "GUARDIAN_CONSTITUTION_VERSION")]
    constitution_version: Option<String>,

    /// Path of the harm-override event schema.
    #[arg(long, env = "GUARDIAN_SCHEMA_PATH")]
    schema_path: Option<PathBuf>,

    /// Socket address to listen on.
    #[arg(long, env = "GUARDIAN_BIND_ADDR")]
    bind_addr: Option<SocketAddr>,
}

impl Cli {
    fn load_config(self) -> guardian_contracts::error::GuardianResult<ServerConfig> {
        let base = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        Ok(base.with_overrides(ConfigOverrides {
            governance_key: self.governance_key,
            audit_log_path: self.audit_log_path,
            constitution_version: self.constitution_version,
            schema_path: self.schema_path,
            bind_addr: self.bind_addr,
        }))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for pipeline stages.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let state = match bootstrap(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "refusing to start");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind_addr, "listening");

    let app = api::create_router(state);
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
