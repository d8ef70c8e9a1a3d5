use std::io::IsTerminal;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use suse_observability_mcp::clients::{
    ObservabilityApi, ObservabilityClient, ServiceConfig, TokenKind,
};
use suse_observability_mcp::server::McpServer;
use suse_observability_mcp::tools::all_tools;
use suse_observability_mcp::transport::{run_http, run_stdio};

#[derive(Parser, Debug)]
#[command(name = "suse-observability-mcp", version)]
#[command(
    about = "MCP server exposing SUSE Observability topology, metrics, monitors, traces and events"
)]
struct Cli {
    /// SUSE Observability base URL
    #[arg(long, env = "SUSE_OBSERVABILITY_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Service token (or API token with --apitoken)
    #[arg(long, env = "SUSE_OBSERVABILITY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Send the token as a personal API token instead of a service token
    #[arg(long, env = "SUSE_OBSERVABILITY_API_TOKEN")]
    apitoken: bool,

    /// Serve MCP over HTTP on this address instead of stdio (e.g. 127.0.0.1:8000)
    #[arg(long)]
    http: Option<SocketAddr>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "SUSE_OBSERVABILITY_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Skip TLS certificate verification (self-signed installations)
    #[arg(long)]
    insecure: bool,

    /// Log filter, e.g. "info" or "suse_observability_mcp=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Client configuration: environment defaults overridden by flags.
    fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::from_env();
        config.endpoint.base_url = self.url.clone();
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            config.endpoint.token = Some(token.clone());
        }
        if self.apitoken {
            config.endpoint.token_kind = TokenKind::Api;
        }
        config.timeout_secs = self.timeout_secs;
        if self.insecure {
            config.verify_tls = false;
        }
        config
    }
}

/// Logs go to stderr; stdout carries the stdio transport.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = cli.service_config();
    config
        .validate()
        .context("Invalid SUSE Observability configuration")?;

    let client = ObservabilityClient::new(&config).context("Failed to create API client")?;
    match client.server_info().await {
        Ok(server_info) => info!(
            url = %config.endpoint.base_url,
            version = %server_info.version.semver(),
            "Connected to SUSE Observability"
        ),
        Err(e) => warn!(
            url = %config.endpoint.base_url,
            "Could not reach SUSE Observability: {}", e
        ),
    }

    let server = McpServer::observability();
    server.register_tools(all_tools(Arc::new(client))).await;
    info!("Registered {} tools", server.list_tools().await.len());
    let server = Arc::new(server);

    match cli.http {
        Some(addr) => run_http(server, addr).await,
        None => run_stdio(server).await,
    }
}
