// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::reminder::{Reminder, ReminderDraft, ReminderFilter, ReminderForm};
use crate::pagination::{Page, PageQuery, DEFAULT_PER_PAGE};
use crate::services::access::RecordScope;
use crate::services::reminder_schedule::send_reminder;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reminders", get(list_reminders).post(create_reminder))
        .route(
            "/api/reminders/{id}",
            get(get_reminder)
                .put(update_reminder)
                .delete(delete_reminder),
        )
        .route("/api/reminders/{id}/clone", post(clone_reminder))
        .route("/api/reminders/{id}/send", post(send_now))
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Reminder {id} not found"))
}

fn scoped(conn: &Connection, user: &AuthUser, id: i64) -> Result<Reminder> {
    db::reminder::get(conn, id, &user.department_scope())?.ok_or_else(|| not_found(id))
}

/// A reminder in scope that the user created.
fn own(conn: &Connection, user: &AuthUser, id: i64) -> Result<Reminder> {
    let reminder = scoped(conn, user, id)?;
    if reminder.created_by.id != user.id() {
        return Err(not_found(id));
    }
    Ok(reminder)
}

/// A reminder the user just wrote, whether or not it falls in their scope.
fn created(conn: &Connection, user: &AuthUser, id: i64) -> Result<Reminder> {
    db::reminder::get(conn, id, &RecordScope::Owner(user.id()))?.ok_or_else(|| not_found(id))
}

async fn list_reminders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<ReminderFilter>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Reminder>>> {
    user.require("reminder.view_reminder")?;

    let scope = user.department_scope();
    let owner = filter
        .created_by
        .filter(|v| !v.trim().is_empty())
        .map(|_| user.id());
    let reminders = state
        .db
        .call(move |conn| Ok(db::reminder::list(conn, &scope, owner)?))
        .await?;
    Ok(Json(Page::paginate(reminders, &page, DEFAULT_PER_PAGE)))
}

async fn get_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Reminder>> {
    user.require("reminder.view_reminder")?;
    state
        .db
        .call(move |conn| scoped(conn, &user, id))
        .await
        .map(Json)
}

async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<ReminderForm>,
) -> Result<(StatusCode, Json<Reminder>)> {
    user.require("reminder.add_reminder")?;
    let draft = form.clean()?;

    let reminder = state
        .db
        .call(move |conn| {
            let id = db::reminder::insert(conn, user.id(), &draft)?;
            created(conn, &user, id)
        })
        .await?;

    tracing::info!(reminder_id = reminder.id, policy = reminder.policy.as_str(), "Reminder created");
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn update_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<ReminderForm>,
) -> Result<Json<Reminder>> {
    user.require("reminder.change_reminder")?;
    let draft = form.clean()?;

    state
        .db
        .call(move |conn| {
            own(conn, &user, id)?;
            db::reminder::update(conn, id, &draft)?;
            own(conn, &user, id)
        })
        .await
        .map(Json)
}

async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("reminder.delete_reminder")?;
    state
        .db
        .call(move |conn| {
            own(conn, &user, id)?;
            Ok(db::reminder::delete(conn, id)?)
        })
        .await?;
    tracing::info!(reminder_id = id, "Reminder deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn clone_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<Reminder>)> {
    user.require("reminder.change_reminder")?;
    let reminder = state
        .db
        .call(move |conn| {
            let source = own(conn, &user, id)?;
            let new_id = db::reminder::insert(conn, user.id(), &ReminderDraft::from(&source))?;
            created(conn, &user, new_id)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

#[derive(Serialize)]
pub struct SendResponse {
    pub sent: bool,
    pub recipients: String,
}

/// Mail an own reminder right away, whatever its schedule.
async fn send_now(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SendResponse>> {
    user.require("reminder.change_reminder")?;
    let reminder = state
        .db
        .call(move |conn| own(conn, &user, id))
        .await?;

    send_reminder(
        state.mailer.as_ref(),
        &reminder,
        &state.config.default_from_email,
    )
    .await?;

    Ok(Json(SendResponse {
        sent: true,
        recipients: reminder.recipients,
    }))
}
