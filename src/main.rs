use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod database;
mod domain;
mod error;
mod http_server;
mod manager;
mod models;
mod ordering;
mod schema;

use http_server::HttpServer;
use manager::ProjectManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projects_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Projects Service v{}", env!("CARGO_PKG_VERSION"));

    let http_port: u16 = std::env::var("HTTP_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("Invalid HTTP_PORT");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable is required");

    let manager = Arc::new(ProjectManager::new(&database_url).await?);
    info!("Project manager initialized successfully");

    let http_server = HttpServer::new(manager);
    let http_addr: SocketAddr = ([0, 0, 0, 0], http_port).into();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = http_server.start(http_addr).await {
            error!("HTTP server error: {}", e);
        }
    });

    info!("Projects Service started successfully");
    info!("HTTP server listening on {}", http_addr);

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, gracefully shutting down...");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    server_handle.abort();

    info!("Projects Service shutdown complete");
    Ok(())
}
