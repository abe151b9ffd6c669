//! # Static HTTP Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada: parsea la CLI, inicializa el logging, carga la
//! configuración y arranca el servidor.

use clap::Parser;
use static_http_server::config::{Cli, ServerConfig};
use static_http_server::error::ServerError;
use static_http_server::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "static_http_server=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        match &e {
            ServerError::Config(_) => {
                tracing::error!(config = %cli.config.display(), error = %e, "invalid configuration")
            }
            _ => tracing::error!(error = %e, "server stopped"),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ServerError> {
    let config = ServerConfig::from_cli(cli)?;
    config.log_summary();

    Server::new(config).run()
}
