// ABOUTME: Server binary wiring configuration, storage and routes into a running HTTP listener
// ABOUTME: Exits non-zero before binding when configuration is missing or invalid
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! # Tenchi Geolocation Server Binary

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tenchi_geolocation::{
    config::ServerConfig, database_plugins::sqlite::SqliteDatabase, logging,
    resources::ServerResources, routes::build_router,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tenchi-server")]
#[command(about = "Tenchi Geolocation - team location sharing server")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    info!(
        http_port = config.http_port,
        database_url = %config.database_url,
        static_dir = %config.static_dir.display(),
        admission_offset = %config.admission_offset,
        webhook = config.webhook_url.is_some(),
        "Starting Tenchi Geolocation server"
    );

    let database = Arc::new(SqliteDatabase::new(&config.database_url).await?);
    database.migrate().await?;
    info!("Database ready");

    let resources = Arc::new(ServerResources::from_config(&config, database));
    let app = build_router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", config.http_port))?;
    info!(address = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
