//! Command-line and environment configuration.
//!
//! Every option can come from a flag or from the environment (`.env` is
//! loaded first). Running without a subcommand opens the terminal dashboard;
//! `serve` starts the HTTP server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};

/// Savings goals, monthly records and expenses with a live dashboard.
///
/// Examples:
///   finance-dashboard serve --port 5000
///   finance-dashboard --server-url http://127.0.0.1:5000
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server the terminal dashboard talks to
    #[arg(long, env = "SERVER_URL", default_value = "http://127.0.0.1:5000")]
    pub server_url: String,

    /// Where the terminal dashboard writes its log (stdout is the UI)
    #[arg(long, value_name = "FILE", default_value = "finance-dashboard-tui.log")]
    pub log_file: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP + realtime server
    #[command(alias = "server")]
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./finance_dashboard.db")]
    pub database_url: String,

    /// Browser origins allowed to call the API (comma separated)
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGIN",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub cors_origins: Vec<String>,

    /// Views buffered per realtime subscriber before it starts skipping
    #[arg(long, default_value_t = 64)]
    pub broadcast_capacity: usize,
}

/// Validated server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub broadcast_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            database_url: "sqlite://./finance_dashboard.db".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            broadcast_capacity: 64,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl ServeArgs {
    pub fn into_config(self) -> Result<ServerConfig> {
        ensure!(
            self.broadcast_capacity > 0,
            "--broadcast-capacity must be at least 1"
        );
        let cors_origins = self
            .cors_origins
            .into_iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(ServerConfig {
            bind: self.bind,
            port: self.port,
            database_url: self.database_url,
            cors_origins,
            broadcast_capacity: self.broadcast_capacity,
        })
    }
}
