// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CTDB API Server
//!
//! Serves the JSON API for diaries, reminders, archives, calendars and the
//! ISP prefix-list workflow.

use ctdb::{config::Config, db::Db, services, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting CTDB API");

    let db = Db::open(&config.database_path)?;

    let mailer = services::build_mailer(&config)?;
    tracing::info!(backend = ?config.mail_backend, "Mailer initialized");

    let storage = services::FileStorage::new(config.media_root.clone());
    tracing::info!(root = %storage.root().display(), "Media storage ready");

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        mailer,
        storage,
    });

    let app = ctdb::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ctdb=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
