// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Work diary routes.
//!
//! Every write is recorded in the diary log.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::account::Group;
use crate::models::diary::{CommentForm, Diary, DiaryFilter, DiaryForm};
use crate::models::log::{NewLogEntry, DIARY_MODEL};
use crate::models::news::News;
use crate::pagination::{Page, PageQuery, DEFAULT_PER_PAGE};
use crate::services::access::RecordScope;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/diaries", get(list_diaries).post(create_diary))
        .route(
            "/api/diaries/{id}",
            get(get_diary).put(update_diary).delete(delete_diary),
        )
        .route("/api/diaries/{id}/comment", put(comment_diary))
        .route("/api/diaries/{id}/clone", post(clone_diary))
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Diary {id} not found"))
}

fn write_log(
    conn: &Connection,
    user: &AuthUser,
    diary_id: i64,
    action: &str,
    message: String,
) -> rusqlite::Result<i64> {
    db::log::insert(
        conn,
        &NewLogEntry {
            model_name: DIARY_MODEL,
            object_id: Some(diary_id),
            action,
            message,
            created_by: Some(user.id()),
        },
    )
}

/// A diary the user wrote.
fn own_diary(conn: &Connection, user: &AuthUser, id: i64) -> Result<Diary> {
    db::diary::get(conn, id, &RecordScope::Owner(user.id()))?.ok_or_else(|| not_found(id))
}

#[derive(Serialize)]
pub struct DiaryListResponse {
    #[serde(flatten)]
    pub page: Page<Diary>,
    /// Groups the activated role supervises, for the department filter
    pub supervise_roles: Vec<Group>,
    pub pinned_news: Vec<News>,
}

async fn list_diaries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<DiaryFilter>,
    Query(page): Query<PageQuery>,
) -> Result<Json<DiaryListResponse>> {
    user.require("diary.view_diary")?;

    let scope = user.personal_scope();
    let supervised = user.supervise_role_ids.clone();
    let authors = state.config.pinned_news_authors.clone();
    let today = state.today();

    let (diaries, supervise_roles, pinned_news) = state
        .db
        .call(move |conn| {
            let diaries = db::diary::list(conn, &scope, &filter)?;
            let mut roles = Vec::new();
            for id in supervised {
                roles.extend(db::accounts::get_group(conn, id)?);
            }
            let news = db::news::pinned(conn, today, &authors)?;
            Ok((diaries, roles, news))
        })
        .await?;

    Ok(Json(DiaryListResponse {
        page: Page::paginate(diaries, &page, DEFAULT_PER_PAGE),
        supervise_roles,
        pinned_news,
    }))
}

async fn get_diary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Diary>> {
    user.require("diary.view_diary")?;
    let scope = user.personal_scope();
    state
        .db
        .call(move |conn| Ok(db::diary::get(conn, id, &scope)?))
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn create_diary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<DiaryForm>,
) -> Result<(StatusCode, Json<Diary>)> {
    user.require("diary.add_diary")?;
    form.validate()?;

    let diary = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let id = db::diary::insert(&tx, user.id(), &form)?;
            write_log(
                &tx,
                &user,
                id,
                "create",
                format!("{} created the diary of {}", user.user.username, form.date),
            )?;
            let diary = own_diary(&tx, &user, id)?;
            tx.commit()?;
            Ok(diary)
        })
        .await?;

    tracing::info!(diary_id = diary.id, user_id = diary.created_by.id, "Diary created");
    Ok((StatusCode::CREATED, Json(diary)))
}

async fn update_diary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<DiaryForm>,
) -> Result<Json<Diary>> {
    user.require("diary.change_diary")?;
    form.validate()?;

    let diary = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            own_diary(&tx, &user, id)?;
            db::diary::update(&tx, id, &form)?;
            write_log(
                &tx,
                &user,
                id,
                "update",
                format!("{} updated the diary of {}", user.user.username, form.date),
            )?;
            let diary = own_diary(&tx, &user, id)?;
            tx.commit()?;
            Ok(diary)
        })
        .await?;
    Ok(Json(diary))
}

/// Supervisor comment on any diary in scope. Only the comment changes.
async fn comment_diary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<CommentForm>,
) -> Result<Json<Diary>> {
    user.require("diary.change_diary")?;
    if !user.is_supervisor() && !user.user.is_superuser {
        return Err(not_found(id));
    }

    let diary = state
        .db
        .call(move |conn| {
            let scope = user.personal_scope();
            let tx = conn.transaction()?;
            let diary = db::diary::get(&tx, id, &scope)?.ok_or_else(|| not_found(id))?;
            db::diary::set_comment(&tx, id, &form.comment)?;
            write_log(
                &tx,
                &user,
                id,
                "comment",
                format!(
                    "{} commented on the diary of {} by {}",
                    user.user.username, diary.date, diary.created_by.username
                ),
            )?;
            let diary = db::diary::get(&tx, id, &scope)?.ok_or_else(|| not_found(id))?;
            tx.commit()?;
            Ok(diary)
        })
        .await?;
    Ok(Json(diary))
}

async fn delete_diary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("diary.delete_diary")?;

    state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let diary = own_diary(&tx, &user, id)?;
            db::diary::delete(&tx, id)?;
            write_log(
                &tx,
                &user,
                id,
                "delete",
                format!("{} deleted the diary of {}", user.user.username, diary.date),
            )?;
            tx.commit()?;
            Ok(())
        })
        .await?;

    tracing::info!(diary_id = id, "Diary deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Copy an own diary to today, without the comment.
async fn clone_diary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<Diary>)> {
    user.require("diary.change_diary")?;
    let today = state.today();

    let diary = state
        .db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let source = own_diary(&tx, &user, id)?;
            let new_id = db::diary::clone_to(&tx, id, today)?;
            write_log(
                &tx,
                &user,
                new_id,
                "clone",
                format!(
                    "{} copied the diary of {} to {}",
                    user.user.username, source.date, today
                ),
            )?;
            let diary = own_diary(&tx, &user, new_id)?;
            tx.commit()?;
            Ok(diary)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(diary)))
}
