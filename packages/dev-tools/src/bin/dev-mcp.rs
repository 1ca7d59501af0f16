//! Development MCP Server
//!
//! Standalone MCP server over an in-memory demo scene. Lets tool-calling
//! clients exercise object commands, checkpoints, batches and image results
//! without a running scene editor.
//!
//! # Usage
//!
//! ```bash
//! # HTTP on port 3100 (or MCP_PORT)
//! cargo run --bin dev-mcp
//!
//! # stdio, for clients that spawn the server
//! cargo run --bin dev-mcp -- --stdio
//! ```
//!
//! Logs go to stderr so they never interleave with stdio protocol output.
//! Set `RUST_LOG` to adjust verbosity.

use scenelink_core::document::Document;
use scenelink_core::services::{McpServerConfig, McpServerService, McpTransport};
use scenelink_dev_tools::{build_registry, Scene};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn transport_from_args() -> McpTransport {
    let stdio_flag = std::env::args().skip(1).any(|arg| arg == "--stdio");
    let stdio_env = std::env::var("MCP_TRANSPORT")
        .map(|value| value.eq_ignore_ascii_case("stdio"))
        .unwrap_or(false);
    if stdio_flag || stdio_env {
        McpTransport::Stdio
    } else {
        McpTransport::Http
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dev_mcp=debug,scenelink_core=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("🔧 Initializing dev-mcp (demo scene MCP server)...");

    let document = Arc::new(Document::new(Scene::default()));
    let registry = build_registry(document)?;
    info!("✅ Registered {} commands", registry.len());

    let config = McpServerConfig::from_env();
    let service = McpServerService::new(Arc::new(registry), config);

    match transport_from_args() {
        McpTransport::Stdio => {
            tokio::select! {
                result = service.serve_stdio() => result?,
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            }
        }
        McpTransport::Http => {
            let handle = service.start().await?;
            info!(
                "AI agents can now connect to: http://{}{}",
                handle.local_addr(),
                service.config().endpoint_path
            );
            tokio::signal::ctrl_c().await?;
            handle.stop().await?;
        }
    }

    Ok(())
}
