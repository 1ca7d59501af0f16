//! MCP Server Service
//!
//! Managed service wrapper for the MCP (Model Context Protocol) server.
//! Owns the session table and the dispatcher built over a command registry,
//! and runs one of the two transports:
//!
//! - HTTP (default) via [`McpServerService::start`], which returns a handle
//!   used to stop the server with a bounded grace period
//! - stdio via [`McpServerService::serve_stdio`]
//!
//! # Configuration
//!
//! [`McpServerConfig::from_env`] reads `MCP_PORT` and `MCP_SESSION_TTL_SECS`
//! on top of the defaults.
//!
//! # Example
//!
//! ```ignore
//! let service = McpServerService::new(Arc::new(registry), McpServerConfig::from_env());
//! let handle = service.start().await?;
//! tokio::signal::ctrl_c().await?;
//! handle.stop().await?;
//! ```

use crate::commands::CommandRegistry;
use crate::mcp::http::{self, DEFAULT_ENDPOINT_PATH, DEFAULT_MAX_BODY_BYTES};
use crate::mcp::server::serve_stream;
use crate::mcp::session::{
    SessionManager, DEFAULT_RECENTLY_EXPIRED_CAPACITY, DEFAULT_SESSION_TTL,
};
use crate::mcp::McpDispatcher;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_MCP_PORT: u16 = 3100;

/// Default time in-flight requests get to finish on shutdown
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Transport the server speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum McpTransport {
    #[default]
    Http,
    Stdio,
}

/// Server settings
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub endpoint_path: String,
    pub session_ttl: Duration,
    pub recently_expired_capacity: usize,
    pub max_body_bytes: usize,
    pub shutdown_grace: Duration,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_MCP_PORT,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
            recently_expired_capacity: DEFAULT_RECENTLY_EXPIRED_CAPACITY,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl McpServerConfig {
    /// Defaults overlaid with `MCP_PORT` and `MCP_SESSION_TTL_SECS`
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self {
            port: default_mcp_port(),
            ..Self::default()
        };
        if let Some(secs) = std::env::var("MCP_SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config.session_ttl = Duration::from_secs(secs);
        }
        config
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Get default MCP port from environment variable or fallback
///
/// Reads `MCP_PORT` environment variable, falling back to 3100 if not set.
pub fn default_mcp_port() -> u16 {
    std::env::var("MCP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_MCP_PORT)
}

/// MCP Server Service
///
/// This service is `Clone` and uses `Arc` internally; clones share the same
/// session table.
#[derive(Clone)]
pub struct McpServerService {
    dispatcher: McpDispatcher,
    config: McpServerConfig,
}

impl McpServerService {
    /// Create a new MCP server service
    ///
    /// # Arguments
    ///
    /// * `registry` - Fully populated command registry
    /// * `config` - Server settings
    pub fn new(registry: Arc<CommandRegistry>, config: McpServerConfig) -> Self {
        let sessions = Arc::new(SessionManager::new(
            config.session_ttl,
            config.recently_expired_capacity,
        ));
        Self {
            dispatcher: McpDispatcher::new(registry, sessions),
            config,
        }
    }

    pub fn config(&self) -> &McpServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &McpDispatcher {
        &self.dispatcher
    }

    /// Router for the configured endpoint, for embedding or testing
    pub fn router(&self) -> axum::Router {
        http::router(
            self.dispatcher.clone(),
            &self.config.endpoint_path,
            self.config.max_body_bytes,
        )
    }

    /// Bind and start serving HTTP in the background
    ///
    /// # Returns
    ///
    /// Returns a handle to the running server, or `Err` if the address cannot
    /// be bound.
    pub async fn start(&self) -> anyhow::Result<McpServerHandle> {
        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        info!(
            "🚀 MCP server listening on http://{}{}",
            local_addr, self.config.endpoint_path
        );

        let (shutdown_tx, mut signal) = watch::channel(false);

        let app = self.router();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.changed().await;
                })
                .await
        });

        Ok(McpServerHandle {
            local_addr,
            shutdown: shutdown_tx,
            server,
            grace: self.config.shutdown_grace,
        })
    }

    /// Serve one newline-delimited session over stdin/stdout until stdin closes
    pub async fn serve_stdio(&self) -> anyhow::Result<()> {
        info!("🚀 MCP server reading JSON-RPC from stdin");
        serve_stream(
            self.dispatcher.clone(),
            tokio::io::stdin(),
            tokio::io::stdout(),
            self.config.max_body_bytes,
        )
        .await
    }
}

/// Handle to a running HTTP server
#[derive(Debug)]
pub struct McpServerHandle {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    server: JoinHandle<std::io::Result<()>>,
    grace: Duration,
}

impl McpServerHandle {
    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections, close open ones, and wait up to the grace
    /// period for in-flight requests before aborting the server task
    pub async fn stop(self) -> anyhow::Result<()> {
        let Self {
            shutdown,
            mut server,
            grace,
            ..
        } = self;

        info!("Stopping MCP server (grace period {:?})", grace);
        let _ = shutdown.send(true);

        match tokio::time::timeout(grace, &mut server).await {
            Ok(joined) => {
                joined??;
                info!("✅ MCP server stopped");
            }
            Err(_) => {
                warn!("⚠️  MCP server did not drain within {:?}; aborting", grace);
                server.abort();
            }
        }
        Ok(())
    }
}
