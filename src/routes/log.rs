// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audit log listings.

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::db;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::log::{LogEntry, ADMIN_MODEL, DIARY_MODEL};
use crate::pagination::{Page, PageQuery, DEFAULT_PER_PAGE};
use crate::AppState;

const ADMIN_LOG_PER_PAGE: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/logs/diary", get(diary_log))
        .route("/api/logs/admin", get(admin_log))
}

/// Diary log entries written by users in the personal scope.
async fn diary_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<LogEntry>>> {
    user.require("log.view_log")?;
    let scope = user.personal_scope();
    let entries = state
        .db
        .call(move |conn| Ok(db::log::list(conn, DIARY_MODEL, Some(&scope))?))
        .await?;
    Ok(Json(Page::paginate(entries, &page, DEFAULT_PER_PAGE)))
}

async fn admin_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<LogEntry>>> {
    user.require("pilotadmin.view_pilotadmin")?;
    let entries = state
        .db
        .call(|conn| Ok(db::log::list(conn, ADMIN_MODEL, None)?))
        .await?;
    Ok(Json(Page::paginate(entries, &page, ADMIN_LOG_PER_PAGE)))
}
