//! Microsoft Graph MCP bridge - entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use graph_bridge_mcp::{config::Config, server::McpServer, store::MemoryKvStore};

#[derive(Parser, Debug)]
#[command(name = "graph-bridge-mcp")]
#[command(about = "MCP server for Microsoft Graph behind an OAuth 2.1 bridge to Entra ID")]
#[command(version)]
struct Cli {
    /// Entra application (client) id
    #[arg(long, env = "ENTRA_CLIENT_ID")]
    client_id: String,

    /// Entra application client secret
    #[arg(long, env = "ENTRA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Entra tenant: a tenant id, or "common" for multi-tenant sign-in
    #[arg(long, default_value = "common", env = "ENTRA_TENANT_ID")]
    tenant: String,

    /// Public base URL of this server, used for the identity provider callback
    #[arg(long, default_value = "http://localhost:8080", env = "MCP_BASE_URL")]
    base_url: String,

    /// Secret for signing state blobs and approval cookies
    #[arg(long, env = "BRIDGE_SIGNING_SECRET", hide_env_values = true)]
    signing_secret: String,

    /// Space-separated Microsoft Graph scopes to request upstream
    #[arg(long, env = "GRAPH_SCOPES")]
    scopes: Option<String>,

    /// Well-known client id resolved through the static alias
    #[arg(long, env = "STATIC_CLIENT_ID")]
    static_client_id: Option<String>,

    /// HTTP server port
    #[arg(long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cli.base_url,
        tenant = %cli.tenant,
        "Starting Microsoft Graph MCP bridge"
    );

    let mut config = Config::new(
        cli.base_url,
        cli.tenant,
        cli.client_id,
        cli.client_secret,
        cli.signing_secret,
    );
    if let Some(scopes) = cli.scopes {
        config.scope = scopes;
    }
    if let Some(id) = cli.static_client_id {
        config.static_client_id = id;
    }

    let server = McpServer::new(config, Arc::new(MemoryKvStore::new()))?;
    server.run_http(cli.port).await
}
