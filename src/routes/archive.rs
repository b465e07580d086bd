// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document archive routes: files, journals and announcements.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::files::{attachment, UploadForm};
use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::archive::{Archive, ArchiveRenameForm, ArchiveType};
use crate::pagination::{Page, PageQuery};
use crate::services::spreadsheet;
use crate::AppState;

const UPLOAD_AREA: &str = "archive";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/archives/{kind}", get(list_archives).post(create_archive))
        .route(
            "/api/archives/{kind}/{id}",
            get(get_archive).put(rename_archive).delete(delete_archive),
        )
        .route("/api/archives/{kind}/{id}/download", get(download_archive))
        .route("/api/archives/{kind}/{id}/convert", post(convert_archive))
}

fn archive_type(kind: &str) -> Result<ArchiveType> {
    ArchiveType::parse(kind).ok_or_else(|| AppError::NotFound(format!("Archive type {kind} not found")))
}

async fn load(state: &AppState, kind: &str, id: i64) -> Result<Archive> {
    let archive_type = archive_type(kind)?;
    state
        .db
        .call(move |conn| Ok(db::archive::get(conn, id)?))
        .await?
        .filter(|a| a.archive_type == archive_type)
        .ok_or_else(|| AppError::NotFound(format!("Archive {id} not found")))
}

async fn load_own(state: &AppState, user: &AuthUser, kind: &str, id: i64) -> Result<Archive> {
    let archive = load(state, kind, id).await?;
    if archive.created_by.id != user.id() {
        return Err(AppError::NotFound(format!("Archive {id} not found")));
    }
    Ok(archive)
}

async fn list_archives(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Archive>>> {
    user.require("archive.view_archive")?;
    let archive_type = archive_type(&kind)?;

    let archives = state
        .db
        .call(move |conn| Ok(db::archive::list(conn, archive_type)?))
        .await?;
    let page = if archive_type.always_show_all() {
        PageQuery::all()
    } else {
        page
    };
    Ok(Json(Page::paginate(archives, &page, archive_type.paginate_by())))
}

async fn get_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Archive>> {
    user.require("archive.view_archive")?;
    load(&state, &kind, id).await.map(Json)
}

/// Multipart upload with a `name` field and an `archive` file.
async fn create_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Archive>)> {
    user.require("archive.add_archive")?;
    let archive_type = archive_type(&kind)?;

    let mut form = UploadForm::read(multipart).await?;
    let name = form.required_text("name")?;
    let upload = form.required_file("archive")?;
    let path = state
        .storage
        .save(UPLOAD_AREA, &upload.file_name, &upload.content)
        .await?;

    let user_id = user.id();
    let stored = path.clone();
    let result = state
        .db
        .call(move |conn| {
            let id = db::archive::insert(conn, user_id, archive_type, &name, &path)?;
            db::archive::get(conn, id)?
                .ok_or_else(|| AppError::NotFound(format!("Archive {id} not found")))
        })
        .await;
    let archive = state.storage.discard_on_error(&stored, result).await?;

    tracing::info!(
        archive_id = archive.id,
        archive_type = archive_type.as_str(),
        bytes = upload.content.len(),
        "Archive uploaded"
    );
    Ok((StatusCode::CREATED, Json(archive)))
}

async fn rename_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, id)): Path<(String, i64)>,
    Json(form): Json<ArchiveRenameForm>,
) -> Result<Json<Archive>> {
    user.require("archive.change_archive")?;
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::field("name", "This field is required."));
    }
    load_own(&state, &user, &kind, id).await?;

    state
        .db
        .call(move |conn| {
            db::archive::rename(conn, id, &name)?;
            db::archive::get(conn, id)?
                .ok_or_else(|| AppError::NotFound(format!("Archive {id} not found")))
        })
        .await
        .map(Json)
}

async fn delete_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<StatusCode> {
    user.require("archive.delete_archive")?;
    let archive = load_own(&state, &user, &kind, id).await?;

    state
        .db
        .call(move |conn| Ok(db::archive::delete(conn, id)?))
        .await?;
    state.storage.delete(&archive.file_path).await?;

    tracing::info!(archive_id = id, "Archive deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn download_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Response> {
    user.require("archive.view_archive")?;
    let archive = load(&state, &kind, id).await?;
    let content = state.storage.read(&archive.file_path).await?;
    Ok(attachment(&archive.full_filename(), content))
}

#[derive(Serialize)]
pub struct ConvertResponse {
    pub created: usize,
}

/// Turn a monthly meeting calendar workbook into reminders.
async fn convert_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ConvertResponse>> {
    user.require("archive.view_archive")?;
    let archive = load(&state, &kind, id).await?;
    if !archive.can_convert_to_reminders() {
        return Err(AppError::BadRequest(
            "此檔案無法轉換為提醒（必須是包含「網應處月會行事曆」的 Excel 檔案）".to_string(),
        ));
    }

    let path = state.storage.resolve(&archive.file_path)?;
    let created = spreadsheet::convert_to_reminders(&state.db, &path, user.id()).await?;
    Ok(Json(ConvertResponse { created }))
}
