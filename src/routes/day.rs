// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Holiday calendar routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::day::{Day, DayForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/days", get(list_days).post(create_day))
        .route(
            "/api/days/{id}",
            get(get_day).put(update_day).delete(delete_day),
        )
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Day {id} not found"))
}

fn check_unique(conn: &Connection, form: &DayForm, except: Option<i64>) -> Result<()> {
    if db::day::date_taken(conn, form.date, except)? {
        return Err(AppError::field("date", "Day with this Date already exists."));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct DayQuery {
    year: Option<i32>,
}

async fn list_days(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<Day>>> {
    user.require("day.view_day")?;
    let days = state
        .db
        .call(move |conn| Ok(db::day::list(conn, query.year)?))
        .await?;
    Ok(Json(days))
}

async fn get_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Day>> {
    user.require("day.view_day")?;
    state
        .db
        .call(move |conn| Ok(db::day::get(conn, id)?))
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn create_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<DayForm>,
) -> Result<(StatusCode, Json<Day>)> {
    user.require("day.add_day")?;
    form.validate()?;

    let day = state
        .db
        .call(move |conn| {
            check_unique(conn, &form, None)?;
            let id = db::day::insert(conn, &form)?;
            db::day::get(conn, id)?.ok_or_else(|| not_found(id))
        })
        .await?;

    tracing::info!(date = %day.date, is_holiday = day.is_holiday, "Day added");
    Ok((StatusCode::CREATED, Json(day)))
}

async fn update_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<DayForm>,
) -> Result<Json<Day>> {
    user.require("day.change_day")?;
    form.validate()?;

    state
        .db
        .call(move |conn| {
            check_unique(conn, &form, Some(id))?;
            if !db::day::update(conn, id, &form)? {
                return Err(not_found(id));
            }
            db::day::get(conn, id)?.ok_or_else(|| not_found(id))
        })
        .await
        .map(Json)
}

async fn delete_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("day.delete_day")?;
    let deleted = state
        .db
        .call(move |conn| Ok(db::day::delete(conn, id)?))
        .await?;
    if !deleted {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
