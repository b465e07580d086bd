// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Glossary terms and tool bookmarks.
//!
//! Anyone with the view permission sees every entry. Only the author may
//! change or delete one.

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
use crate::models::account::UserSummary;
use crate::models::terms::{Term, TermForm, Tool, ToolForm};
use crate::pagination::{Page, PageQuery, DEFAULT_PER_PAGE};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/terms", get(list_terms).post(create_term))
        .route("/api/terms/{id}", get(get_term).put(update_term).delete(delete_term))
        .route("/api/tools", get(list_tools).post(create_tool))
        .route("/api/tools/{id}", get(get_tool).put(update_tool).delete(delete_tool))
}

fn term_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Term {id} not found"))
}

fn tool_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Tool {id} not found"))
}

fn is_author(created_by: &Option<UserSummary>, user: &AuthUser) -> bool {
    created_by.as_ref().is_some_and(|u| u.id == user.id())
}

async fn list_terms(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Term>>> {
    user.require("terms.view_terms")?;
    let terms = state
        .db
        .call(|conn| Ok(db::terms::list_terms(conn)?))
        .await?;
    Ok(Json(Page::paginate(terms, &page, DEFAULT_PER_PAGE)))
}

async fn get_term(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Term>> {
    user.require("terms.view_terms")?;
    state
        .db
        .call(move |conn| Ok(db::terms::get_term(conn, id)?))
        .await?
        .map(Json)
        .ok_or_else(|| term_not_found(id))
}

async fn create_term(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<TermForm>,
) -> Result<(StatusCode, Json<Term>)> {
    user.require("terms.add_terms")?;
    let form = form.normalize();
    form.validate()?;

    let user_id = user.id();
    let term = state
        .db
        .call(move |conn| {
            let id = db::terms::insert_term(conn, user_id, &form)?;
            db::terms::get_term(conn, id)?.ok_or_else(|| term_not_found(id))
        })
        .await?;
    tracing::info!(term_id = term.id, short_name = %term.short_name, "Term created");
    Ok((StatusCode::CREATED, Json(term)))
}

async fn update_term(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<TermForm>,
) -> Result<Json<Term>> {
    user.require("terms.change_terms")?;
    let form = form.normalize();
    form.validate()?;

    state
        .db
        .call(move |conn| {
            match db::terms::get_term(conn, id)? {
                Some(term) if is_author(&term.created_by, &user) => {}
                _ => return Err(term_not_found(id)),
            }
            db::terms::update_term(conn, id, &form)?;
            db::terms::get_term(conn, id)?.ok_or_else(|| term_not_found(id))
        })
        .await
        .map(Json)
}

async fn delete_term(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("terms.delete_terms")?;
    state
        .db
        .call(move |conn| {
            match db::terms::get_term(conn, id)? {
                Some(term) if is_author(&term.created_by, &user) => {}
                _ => return Err(term_not_found(id)),
            }
            Ok(db::terms::delete_term(conn, id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tools(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Tool>>> {
    user.require("tool.view_tool")?;
    let tools = state
        .db
        .call(|conn| Ok(db::terms::list_tools(conn)?))
        .await?;
    Ok(Json(Page::paginate(tools, &page, DEFAULT_PER_PAGE)))
}

async fn get_tool(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Tool>> {
    user.require("tool.view_tool")?;
    state
        .db
        .call(move |conn| Ok(db::terms::get_tool(conn, id)?))
        .await?
        .map(Json)
        .ok_or_else(|| tool_not_found(id))
}

async fn create_tool(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<ToolForm>,
) -> Result<(StatusCode, Json<Tool>)> {
    user.require("tool.add_tool")?;
    form.validate()?;

    let user_id = user.id();
    let tool = state
        .db
        .call(move |conn| {
            let id = db::terms::insert_tool(conn, user_id, &form)?;
            db::terms::get_tool(conn, id)?.ok_or_else(|| tool_not_found(id))
        })
        .await?;
    Ok((StatusCode::CREATED, Json(tool)))
}

async fn update_tool(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<ToolForm>,
) -> Result<Json<Tool>> {
    user.require("tool.change_tool")?;
    form.validate()?;

    state
        .db
        .call(move |conn| {
            match db::terms::get_tool(conn, id)? {
                Some(tool) if is_author(&tool.created_by, &user) => {}
                _ => return Err(tool_not_found(id)),
            }
            db::terms::update_tool(conn, id, &form)?;
            db::terms::get_tool(conn, id)?.ok_or_else(|| tool_not_found(id))
        })
        .await
        .map(Json)
}

async fn delete_tool(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("tool.delete_tool")?;
    state
        .db
        .call(move |conn| {
            match db::terms::get_tool(conn, id)? {
                Some(tool) if is_author(&tool.created_by, &user) => {}
                _ => return Err(tool_not_found(id)),
            }
            Ok(db::terms::delete_tool(conn, id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
