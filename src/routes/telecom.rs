// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telecom routes: ISPs, ISP groups, prefix-list update tasks with their
//! attachments and letters, and the telecom file archive.

use std::collections::{BTreeMap, HashSet};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use super::files::{attachment, UploadForm};
use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::archive::full_filename;
use crate::models::telecom::{
    FileKind, Isp, IspForm, IspGroup, IspGroupForm, IspRef, PrefixListTask, TaskFile, TaskForm,
    TelecomArchive,
};
use crate::pagination::{Page, PageQuery, DEFAULT_PER_PAGE};
use crate::services::access::RecordScope;
use crate::services::task_mail::{self, SendReport, TaskPreview};
use crate::time_utils::{format_local_timestamp, now_local};
use crate::AppState;

const TASK_UPLOAD_AREA: &str = "telecom";
const ARCHIVE_UPLOAD_AREA: &str = "telecom_archive";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/telecom/isps", get(list_isps).post(create_isp))
        .route(
            "/api/telecom/isps/{id}",
            get(get_isp).put(update_isp).delete(delete_isp),
        )
        .route("/api/telecom/isp-groups", get(list_groups).post(create_group))
        .route(
            "/api/telecom/isp-groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/api/telecom/tasks", get(list_tasks).post(create_task))
        .route("/api/telecom/tasks/form", get(task_form_choices))
        .route(
            "/api/telecom/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/telecom/tasks/{id}/clone", post(clone_task))
        .route("/api/telecom/tasks/{id}/attachments", post(upload_attachment))
        .route(
            "/api/telecom/tasks/{id}/attachments/{file_id}",
            get(download_attachment),
        )
        .route(
            "/api/telecom/tasks/{id}/attachments/{kind}/{file_id}/{isp_id}",
            delete(remove_attachment),
        )
        .route("/api/telecom/tasks/{id}/preview", get(preview_task))
        .route("/api/telecom/tasks/{id}/send-mail", post(send_task_mail))
        .route("/api/telecom/archives", get(list_archives).post(create_archive))
        .route(
            "/api/telecom/archives/{id}",
            get(get_archive).put(update_archive).delete(delete_archive),
        )
        .route("/api/telecom/archives/{id}/download", get(download_archive))
}

fn isp_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("ISP {id} not found"))
}

fn group_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("ISP group {id} not found"))
}

fn task_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Prefix-list task {id} not found"))
}

fn archive_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Telecom archive {id} not found"))
}

/// Reject ids that are not ISPs in `scope`.
fn check_isp_choices(conn: &Connection, scope: &RecordScope, field: &str, ids: &[i64]) -> Result<()> {
    let unique: HashSet<i64> = ids.iter().copied().collect();
    if db::telecom::count_isps_in_scope(conn, scope, ids)? != unique.len() {
        return Err(AppError::field(field, "Select a valid choice."));
    }
    Ok(())
}

fn check_group_choices(conn: &Connection, scope: &RecordScope, ids: &[i64]) -> Result<()> {
    let unique: HashSet<i64> = ids.iter().copied().collect();
    if db::telecom::count_groups_in_scope(conn, scope, ids)? != unique.len() {
        return Err(AppError::field("isp_groups", "Select a valid choice."));
    }
    Ok(())
}

// ─── ISPs ────────────────────────────────────────────────────

async fn list_isps(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Isp>>> {
    user.require("telecom.view_isp")?;
    let scope = user.department_scope();
    let isps = state
        .db
        .call(move |conn| Ok(db::telecom::list_isps(conn, &scope)?))
        .await?;
    Ok(Json(Page::paginate(isps, &page, DEFAULT_PER_PAGE)))
}

async fn get_isp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Isp>> {
    user.require("telecom.view_isp")?;
    let scope = user.department_scope();
    state
        .db
        .call(move |conn| Ok(db::telecom::get_isp(conn, id, &scope)?))
        .await?
        .map(Json)
        .ok_or_else(|| isp_not_found(id))
}

async fn create_isp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<IspForm>,
) -> Result<(StatusCode, Json<Isp>)> {
    user.require("telecom.add_isp")?;
    form.validate()?;

    let user_id = user.id();
    let isp = state
        .db
        .call(move |conn| {
            let id = db::telecom::insert_isp(conn, user_id, &form)?;
            db::telecom::get_isp(conn, id, &RecordScope::Owner(user_id))?
                .ok_or_else(|| isp_not_found(id))
        })
        .await?;

    tracing::info!(isp_id = isp.id, name = %isp.name, "ISP created");
    Ok((StatusCode::CREATED, Json(isp)))
}

async fn update_isp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<IspForm>,
) -> Result<Json<Isp>> {
    user.require("telecom.change_isp")?;
    form.validate()?;

    let scope = user.department_scope();
    state
        .db
        .call(move |conn| {
            db::telecom::get_isp(conn, id, &scope)?.ok_or_else(|| isp_not_found(id))?;
            db::telecom::update_isp(conn, id, &form)?;
            db::telecom::get_isp(conn, id, &scope)?.ok_or_else(|| isp_not_found(id))
        })
        .await
        .map(Json)
}

async fn delete_isp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("telecom.delete_isp")?;
    let scope = user.department_scope();
    state
        .db
        .call(move |conn| {
            db::telecom::get_isp(conn, id, &scope)?.ok_or_else(|| isp_not_found(id))?;
            Ok(db::telecom::delete_isp(conn, id)?)
        })
        .await?;
    tracing::info!(isp_id = id, "ISP deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── ISP groups ──────────────────────────────────────────────

async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<IspGroup>>> {
    user.require("telecom.view_ispgroup")?;
    let scope = user.department_scope();
    let groups = state
        .db
        .call(move |conn| Ok(db::telecom::list_groups(conn, &scope)?))
        .await?;
    Ok(Json(Page::paginate(groups, &page, DEFAULT_PER_PAGE)))
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<IspGroup>> {
    user.require("telecom.view_ispgroup")?;
    let scope = user.department_scope();
    state
        .db
        .call(move |conn| Ok(db::telecom::get_group(conn, id, &scope)?))
        .await?
        .map(Json)
        .ok_or_else(|| group_not_found(id))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<IspGroupForm>,
) -> Result<(StatusCode, Json<IspGroup>)> {
    user.require("telecom.add_ispgroup")?;
    form.validate()?;

    let scope = user.department_scope();
    let user_id = user.id();
    let group = state
        .db
        .call(move |conn| {
            check_isp_choices(conn, &scope, "isps", &form.isps)?;
            let id = db::telecom::insert_group(conn, user_id, &form)?;
            db::telecom::get_group(conn, id, &RecordScope::Owner(user_id))?
                .ok_or_else(|| group_not_found(id))
        })
        .await?;

    tracing::info!(group_id = group.id, isps = group.isps.len(), "ISP group created");
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<IspGroupForm>,
) -> Result<Json<IspGroup>> {
    user.require("telecom.change_ispgroup")?;
    form.validate()?;

    let scope = user.department_scope();
    state
        .db
        .call(move |conn| {
            db::telecom::get_group(conn, id, &scope)?.ok_or_else(|| group_not_found(id))?;
            check_isp_choices(conn, &scope, "isps", &form.isps)?;
            db::telecom::update_group(conn, id, &form)?;
            db::telecom::get_group(conn, id, &scope)?.ok_or_else(|| group_not_found(id))
        })
        .await
        .map(Json)
}

async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("telecom.delete_ispgroup")?;
    let scope = user.department_scope();
    state
        .db
        .call(move |conn| {
            db::telecom::get_group(conn, id, &scope)?.ok_or_else(|| group_not_found(id))?;
            Ok(db::telecom::delete_group(conn, id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Prefix-list tasks ───────────────────────────────────────

fn scoped_task(conn: &Connection, user: &AuthUser, id: i64) -> Result<PrefixListTask> {
    db::telecom::get_task(conn, id, &user.department_scope())?.ok_or_else(|| task_not_found(id))
}

fn check_task_form(conn: &Connection, scope: &RecordScope, form: &TaskForm) -> Result<()> {
    check_isp_choices(conn, scope, "isps", &form.isps)?;
    check_group_choices(conn, scope, &form.isp_groups)
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<PrefixListTask>>> {
    user.require("telecom.view_prefixlistupdatetask")?;
    let scope = user.department_scope();
    let tasks = state
        .db
        .call(move |conn| Ok(db::telecom::list_tasks(conn, &scope)?))
        .await?;
    Ok(Json(Page::paginate(tasks, &page, DEFAULT_PER_PAGE)))
}

/// Choices for the task form.
#[derive(Serialize)]
pub struct TaskFormChoices {
    pub isps: Vec<IspRef>,
    pub isp_groups: Vec<IspRef>,
    /// Member ISP ids per group id
    pub group_isp_map: BTreeMap<i64, Vec<i64>>,
}

async fn task_form_choices(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TaskFormChoices>> {
    user.require("telecom.add_prefixlistupdatetask")?;
    let scope = user.department_scope();
    state
        .db
        .call(move |conn| {
            let isps = db::telecom::list_isps(conn, &scope)?
                .into_iter()
                .map(|isp| IspRef {
                    id: isp.id,
                    name: isp.label(),
                })
                .collect();
            let isp_groups = db::telecom::list_groups(conn, &scope)?
                .into_iter()
                .map(|g| IspRef { id: g.id, name: g.name })
                .collect();
            Ok(TaskFormChoices {
                isps,
                isp_groups,
                group_isp_map: db::telecom::group_isp_map(conn, &scope)?,
            })
        })
        .await
        .map(Json)
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<PrefixListTask>> {
    user.require("telecom.view_prefixlistupdatetask")?;
    state
        .db
        .call(move |conn| scoped_task(conn, &user, id))
        .await
        .map(Json)
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<TaskForm>,
) -> Result<(StatusCode, Json<PrefixListTask>)> {
    user.require("telecom.add_prefixlistupdatetask")?;
    form.validate()?;

    let task = state
        .db
        .call(move |conn| {
            check_task_form(conn, &user.department_scope(), &form)?;
            let id = db::telecom::insert_task(conn, user.id(), &form)?;
            db::telecom::get_task(conn, id, &RecordScope::Owner(user.id()))?
                .ok_or_else(|| task_not_found(id))
        })
        .await?;

    tracing::info!(task_id = task.id, origin_as = %task.origin_as, "Prefix-list task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<TaskForm>,
) -> Result<Json<PrefixListTask>> {
    user.require("telecom.change_prefixlistupdatetask")?;
    form.validate()?;

    state
        .db
        .call(move |conn| {
            scoped_task(conn, &user, id)?;
            check_task_form(conn, &user.department_scope(), &form)?;
            db::telecom::update_task(conn, id, &form)?;
            scoped_task(conn, &user, id)
        })
        .await
        .map(Json)
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("telecom.delete_prefixlistupdatetask")?;
    let orphaned = state
        .db
        .call(move |conn| {
            scoped_task(conn, &user, id)?;
            Ok(db::telecom::delete_task(conn, id)?)
        })
        .await?;

    for path in &orphaned {
        state.storage.delete(path).await?;
    }
    tracing::info!(task_id = id, files_removed = orphaned.len(), "Prefix-list task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Copy a task without its attachments or send time.
async fn clone_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<PrefixListTask>)> {
    user.require("telecom.add_prefixlistupdatetask")?;
    let task = state
        .db
        .call(move |conn| {
            scoped_task(conn, &user, id)?;
            let new_id = db::telecom::clone_task(conn, id, user.id())?;
            db::telecom::get_task(conn, new_id, &RecordScope::Owner(user.id()))?
                .ok_or_else(|| task_not_found(new_id))
        })
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

// ─── Attachments ─────────────────────────────────────────────

/// Multipart upload: `kind` (roa, loa, extra_file), `isps` (ids among the
/// task's recipients) and the `file` itself.
async fn upload_attachment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<TaskFile>>)> {
    user.require("telecom.change_prefixlistupdatetask")?;

    let mut form = UploadForm::read(multipart).await?;
    let kind_raw = form.required_text("kind")?;
    let kind = FileKind::parse(&kind_raw)
        .ok_or_else(|| AppError::field("kind", format!("\"{kind_raw}\" is not a valid file kind.")))?;
    let isps = form.ids("isps")?;
    if isps.is_empty() {
        return Err(AppError::field("isps", "This field is required."));
    }
    let upload = form.required_file("file")?;

    let recipients: HashSet<i64> = {
        let user = user.clone();
        state
            .db
            .call(move |conn| {
                scoped_task(conn, &user, id)?;
                Ok(db::telecom::recipient_isps(conn, id)?)
            })
            .await?
            .into_iter()
            .map(|isp| isp.id)
            .collect()
    };
    if let Some(bad) = isps.iter().find(|isp| !recipients.contains(isp)) {
        return Err(AppError::field(
            "isps",
            format!("ISP {bad} is not a recipient of this task."),
        ));
    }

    let path = state
        .storage
        .save(TASK_UPLOAD_AREA, &upload.file_name, &upload.content)
        .await?;
    let name = upload.file_name.clone();
    let stored = path.clone();
    let result = state
        .db
        .call(move |conn| {
            let file_id = db::telecom::attach_file(conn, id, kind, &name, &path, &isps)?;
            Ok(db::telecom::task_files(conn, id)?
                .into_iter()
                .filter(|f| f.file_id == file_id)
                .collect::<Vec<_>>())
        })
        .await;
    let files = state.storage.discard_on_error(&stored, result).await?;

    tracing::info!(
        task_id = id,
        kind = kind.as_str(),
        links = files.len(),
        bytes = upload.content.len(),
        "Task attachment uploaded"
    );
    Ok((StatusCode::CREATED, Json(files)))
}

async fn download_attachment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, file_id)): Path<(i64, i64)>,
) -> Result<Response> {
    user.require("telecom.view_prefixlistupdatetask")?;
    let file = state
        .db
        .call(move |conn| Ok(scoped_task(conn, &user, id)?.files))
        .await?
        .into_iter()
        .find(|f| f.file_id == file_id)
        .ok_or_else(|| AppError::NotFound(format!("Attachment {file_id} not found")))?;

    let content = state.storage.read(&file.file_path).await?;
    Ok(attachment(&file.name, content))
}

/// Unlink a file from one ISP. The file goes away with its last link.
async fn remove_attachment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, kind, file_id, isp_id)): Path<(i64, String, i64, i64)>,
) -> Result<StatusCode> {
    user.require("telecom.change_prefixlistupdatetask")?;
    let kind = FileKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Attachment kind {kind} not found")))?;

    let (removed, orphaned) = state
        .db
        .call(move |conn| {
            scoped_task(conn, &user, id)?;
            Ok(db::telecom::detach_file(conn, id, kind, file_id, isp_id)?)
        })
        .await?;
    if !removed {
        return Err(AppError::NotFound(format!("Attachment {file_id} not found")));
    }
    if let Some(path) = orphaned {
        state.storage.delete(&path).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ─── Letters ─────────────────────────────────────────────────

async fn load_task_and_recipients(
    state: &AppState,
    user: AuthUser,
    id: i64,
) -> Result<(PrefixListTask, Vec<Isp>)> {
    state
        .db
        .call(move |conn| {
            let task = scoped_task(conn, &user, id)?;
            let isps = db::telecom::recipient_isps(conn, id)?;
            Ok((task, isps))
        })
        .await
}

async fn preview_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<TaskPreview>> {
    user.require("telecom.change_prefixlistupdatetask")?;
    let (task, isps) = load_task_and_recipients(&state, user, id).await?;
    Ok(Json(task_mail::preview(&task, isps, &state.config.hinet_mail)))
}

#[derive(Serialize)]
pub struct SendMailResponse {
    #[serde(flatten)]
    pub report: SendReport,
    pub mail_sent_time: String,
}

/// Mail the task to every recipient ISP and record when it went out.
async fn send_task_mail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SendMailResponse>> {
    user.require("telecom.change_prefixlistupdatetask")?;
    let (task, isps) = load_task_and_recipients(&state, user, id).await?;

    let report = task_mail::send_letters(
        state.mailer.as_ref(),
        &state.storage,
        &state.config.telecom_from_email,
        &state.config.hinet_mail,
        &task,
        isps,
    )
    .await;

    let mail_sent_time = format_local_timestamp(now_local(state.config.time_zone).naive_local());
    let sent_at = mail_sent_time.clone();
    state
        .db
        .call(move |conn| Ok(db::telecom::set_mail_sent_time(conn, id, &sent_at)?))
        .await?;

    tracing::info!(
        task_id = id,
        sent = report.sent.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "Prefix-list task mailed"
    );
    Ok(Json(SendMailResponse {
        report,
        mail_sent_time,
    }))
}

// ─── Telecom archive ─────────────────────────────────────────

async fn load_archive(state: &AppState, id: i64) -> Result<TelecomArchive> {
    state
        .db
        .call(move |conn| Ok(db::telecom::get_archive(conn, id)?))
        .await?
        .ok_or_else(|| archive_not_found(id))
}

async fn load_own_archive(state: &AppState, user: &AuthUser, id: i64) -> Result<TelecomArchive> {
    let archive = load_archive(state, id).await?;
    if archive.created_by.id != user.id() {
        return Err(archive_not_found(id));
    }
    Ok(archive)
}

async fn list_archives(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<TelecomArchive>>> {
    user.require("telecom.view_archive")?;
    let archives = state
        .db
        .call(|conn| Ok(db::telecom::list_archives(conn)?))
        .await?;
    Ok(Json(Page::paginate(archives, &page, DEFAULT_PER_PAGE)))
}

async fn get_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<TelecomArchive>> {
    user.require("telecom.view_archive")?;
    load_archive(&state, id).await.map(Json)
}

/// Multipart upload with `name` and an `archive` file, dated today.
async fn create_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<TelecomArchive>)> {
    user.require("telecom.add_archive")?;
    let mut form = UploadForm::read(multipart).await?;
    let name = form.required_text("name")?;
    let upload = form.required_file("archive")?;
    let path = state
        .storage
        .save(ARCHIVE_UPLOAD_AREA, &upload.file_name, &upload.content)
        .await?;

    let user_id = user.id();
    let today = state.today();
    let stored = path.clone();
    let result = state
        .db
        .call(move |conn| {
            let id = db::telecom::insert_archive(conn, user_id, &name, &path, today)?;
            db::telecom::get_archive(conn, id)?.ok_or_else(|| archive_not_found(id))
        })
        .await;
    let archive = state.storage.discard_on_error(&stored, result).await?;
    Ok((StatusCode::CREATED, Json(archive)))
}

/// Rename an own archive and optionally replace its file. The date resets
/// to today.
async fn update_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<TelecomArchive>> {
    user.require("telecom.change_archive")?;
    let current = load_own_archive(&state, &user, id).await?;

    let mut form = UploadForm::read(multipart).await?;
    let name = form.required_text("name")?;
    let replaced = match form.take_file("archive").filter(|u| !u.content.is_empty()) {
        Some(upload) => Some(
            state
                .storage
                .save(ARCHIVE_UPLOAD_AREA, &upload.file_name, &upload.content)
                .await?,
        ),
        None => None,
    };

    let today = state.today();
    let path = replaced.clone().unwrap_or_else(|| current.file_path.clone());
    let result = state
        .db
        .call(move |conn| {
            db::telecom::update_archive(conn, id, &name, &path, today)?;
            db::telecom::get_archive(conn, id)?.ok_or_else(|| archive_not_found(id))
        })
        .await;

    let archive = match &replaced {
        Some(new_path) => {
            let archive = state.storage.discard_on_error(new_path, result).await?;
            state.storage.delete(&current.file_path).await?;
            archive
        }
        None => result?,
    };
    Ok(Json(archive))
}

async fn delete_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("telecom.delete_archive")?;
    let archive = load_own_archive(&state, &user, id).await?;
    state
        .db
        .call(move |conn| Ok(db::telecom::delete_archive(conn, id)?))
        .await?;
    state.storage.delete(&archive.file_path).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Response> {
    user.require("telecom.view_archive")?;
    let archive = load_archive(&state, id).await?;
    let content = state.storage.read(&archive.file_path).await?;
    Ok(attachment(
        &full_filename(&archive.name, &archive.file_path),
        content,
    ))
}
