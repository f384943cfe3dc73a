//! Valthera MCP Server - behavior-readiness evaluations for MCP clients.
//!
//! This binary exposes the valthera pipeline as MCP tools over the stdio
//! transport, the standard for local MCP servers.
//!
//! # Configuration
//!
//! - `VALTHERA_CONFIG` - Optional path to a `.toml`, `.json` or `.yaml`
//!   config file. Defaults to `~/.valthera/config.toml` when it exists.
//! - Without a config file, settings come from the environment
//!   (`VALTHERA_LLM_PROVIDER`, `VALTHERA_LLM_MODEL`, thresholds, ...).
//! - `OPENAI_API_KEY` or `ANTHROPIC_API_KEY` - Required by the chosen provider.
//!
//! A `.env` file in the working directory is loaded first.
//!
//! # Usage with Claude Code
//!
//! Add to `~/.config/claude/claude_desktop_config.json`:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "valthera": {
//!       "command": "/path/to/valthera-mcp"
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use valthera_core::{ValtheraAgent, ValtheraConfig};
use valthera_llm::OracleFactory;

mod server;
mod tools;

use server::ValtheraServer;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing to stderr (stdout is used for MCP transport)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    tracing::info!("Starting Valthera MCP server");

    let config = load_config()?;
    let connector_timeout = config.connector_timeout();

    let oracles = OracleFactory::from_config(&config.llm)?;
    tracing::info!(
        provider = ?config.llm.provider,
        model = %config.llm.config.model,
        "Oracles ready"
    );

    let agent = ValtheraAgent::from_config(config, oracles.generation, Some(oracles.reasoning))?;
    let server = ValtheraServer::new(Arc::new(agent), connector_timeout);

    // Serve via stdio transport
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Server error: {:?}", e);
    })?;

    tracing::info!("MCP server running on stdio");

    service.waiting().await?;
    Ok(())
}

/// Resolve configuration: explicit file, then the home-directory default,
/// then the environment.
fn load_config() -> Result<ValtheraConfig> {
    let path = std::env::var("VALTHERA_CONFIG")
        .map(PathBuf::from)
        .ok()
        .or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".valthera").join("config.toml"))
                .filter(|p| p.exists())
        });

    let config = match path {
        Some(path) => {
            tracing::info!("Config file: {}", path.display());
            ValtheraConfig::from_file(&path)?
        }
        None => {
            tracing::info!("No config file, reading environment");
            ValtheraConfig::from_env()?
        }
    };
    config.validate()?;
    Ok(config)
}
