// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! News routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::news::{News, NewsForm};
use crate::pagination::{Page, PageQuery, DEFAULT_PER_PAGE};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/news", get(list_news).post(create_news))
        .route(
            "/api/news/{id}",
            get(get_news).put(update_news).delete(delete_news),
        )
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("News {id} not found"))
}

async fn list_news(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<News>>> {
    user.require("news.view_news")?;
    let news = state.db.call(|conn| Ok(db::news::list(conn)?)).await?;
    Ok(Json(Page::paginate(news, &page, DEFAULT_PER_PAGE)))
}

async fn get_news(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<News>> {
    user.require("news.view_news")?;
    state
        .db
        .call(move |conn| Ok(db::news::get(conn, id)?))
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn create_news(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<NewsForm>,
) -> Result<(StatusCode, Json<News>)> {
    user.require("news.add_news")?;
    form.validate()?;

    let user_id = user.id();
    let news = state
        .db
        .call(move |conn| {
            let id = db::news::insert(conn, user_id, &form)?;
            db::news::get(conn, id)?.ok_or_else(|| not_found(id))
        })
        .await?;

    tracing::info!(news_id = news.id, pinned = news.is_pinned, "News posted");
    Ok((StatusCode::CREATED, Json(news)))
}

async fn update_news(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<NewsForm>,
) -> Result<Json<News>> {
    user.require("news.change_news")?;
    form.validate()?;

    state
        .db
        .call(move |conn| {
            if !db::news::update(conn, id, &form)? {
                return Err(not_found(id));
            }
            db::news::get(conn, id)?.ok_or_else(|| not_found(id))
        })
        .await
        .map(Json)
}

async fn delete_news(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("news.delete_news")?;
    let deleted = state
        .db
        .call(move |conn| Ok(db::news::delete(conn, id)?))
        .await?;
    if !deleted {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
