// src/main.rs
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::anyhow;
use clap::Parser;
use dotenvy::dotenv;
use finance_dashboard::config::{Args, Command};
use finance_dashboard::{backend, cli, database};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    match args.command {
        Some(Command::Serve(serve)) => {
            init_logging(args.verbose, None)?;
            let config = serve.into_config()?;
            info!("finance-dashboard v{} starting backend server", env!("CARGO_PKG_VERSION"));

            let pool = database::db::connection::get_db_pool(&config.database_url).await?;
            database::db::migrate::run_migrations(&pool).await?;

            backend::run_server(pool, config).await?;
        }
        None => {
            init_logging(args.verbose, Some(&args.log_file))?;
            info!("finance-dashboard v{} starting terminal client", env!("CARGO_PKG_VERSION"));

            cli::run(&args.server_url).await?;
        }
    }
    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_filter = if verbose { "finance_dashboard=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.try_init(),
    }
    .map_err(|e| anyhow!("failed to set tracing subscriber: {e}"))
}
