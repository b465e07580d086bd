// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod accounts;
pub mod archive;
pub mod auth;
pub mod calendar;
pub mod day;
pub mod diary;
pub mod files;
pub mod log;
pub mod news;
pub mod reminder;
pub mod telecom;
pub mod terms;

use crate::middleware::auth::require_auth;
use crate::AppState;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, request::Parts, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Largest accepted request body (uploads included).
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub build_id: &'static str,
}

/// Liveness plus a trivial query against the database.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state
        .db
        .call(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check query failed");
            "unavailable"
        }
    };
    Json(HealthResponse {
        status: "ok",
        database,
        build_id: option_env!("BUILD_ID").unwrap_or("unknown"),
    })
}

/// The configured frontend, plus local dev servers.
fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
            let origin = origin.to_str().unwrap_or("");
            origin == frontend_url
                || origin.starts_with("http://localhost")
                || origin.starts_with("http://127.0.0.1")
        }))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Routes that need an authenticated user.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(accounts::routes())
        .merge(diary::routes())
        .merge(log::routes())
        .merge(day::routes())
        .merge(news::routes())
        .merge(reminder::routes())
        .merge(archive::routes())
        .merge(telecom::routes())
        .merge(calendar::routes())
        .merge(terms::routes())
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.frontend_url.clone());

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    let protected_routes =
        api_routes().route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
