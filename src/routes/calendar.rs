// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Department calendar routes.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use rusqlite::Connection;
use std::sync::Arc;
use validator::Validate;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::calendar::{CalendarEvent, EventForm, FeedEvent, DEFAULT_EVENT_COLOR};
use crate::services::access::RecordScope;
use crate::time_utils::format_iso_local;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/calendar/feed", get(event_feed))
        .route("/api/calendar/events", post(create_event))
        .route(
            "/api/calendar/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Event {id} not found"))
}

/// Convert events to feed entries colored by creator username.
pub fn feed_entries(events: &[CalendarEvent], colors: &HashMap<String, String>) -> Vec<FeedEvent> {
    events
        .iter()
        .map(|e| FeedEvent {
            id: e.id,
            title: e.title.clone(),
            start: format_iso_local(e.start_time),
            end: format_iso_local(e.end_time),
            color: colors
                .get(&e.created_by.username)
                .cloned()
                .unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string()),
            created_by: e.created_by.name.clone(),
        })
        .collect()
}

/// Events of the activated department. Empty without one.
async fn event_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FeedEvent>>> {
    let Some(department) = user.activated_department() else {
        return Ok(Json(Vec::new()));
    };
    let events = state
        .db
        .call(move |conn| Ok(db::calendar::list_for_department(conn, department)?))
        .await?;
    Ok(Json(feed_entries(&events, &state.config.calendar_user_colors)))
}

/// Participants must be active members of the activated department.
fn check_participants(conn: &Connection, department: Option<i64>, participants: &[i64]) -> Result<()> {
    if participants.is_empty() {
        return Ok(());
    }
    let members: HashSet<i64> = match department {
        Some(dep) => db::accounts::group_members(conn, dep, true)?
            .into_iter()
            .map(|u| u.id)
            .collect(),
        None => HashSet::new(),
    };
    if let Some(bad) = participants.iter().find(|id| !members.contains(id)) {
        return Err(AppError::field(
            "participants",
            format!("Select a valid choice. {bad} is not one of the available choices."),
        ));
    }
    Ok(())
}

fn own_event(conn: &Connection, user: &AuthUser, id: i64) -> Result<CalendarEvent> {
    let event = db::calendar::get(conn, id, None, &RecordScope::Owner(user.id()))?
        .ok_or_else(|| not_found(id))?;
    Ok(event)
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<CalendarEvent>> {
    user.require("dep_calendar.view_calendarevent")?;
    let department = user.activated_department();
    let owner = RecordScope::Owner(user.id());
    state
        .db
        .call(move |conn| Ok(db::calendar::get(conn, id, department, &owner)?))
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<EventForm>,
) -> Result<(StatusCode, Json<CalendarEvent>)> {
    user.require("dep_calendar.add_calendarevent")?;
    form.validate()?;
    let department = user.activated_department().ok_or_else(|| {
        AppError::BadRequest("Activate a department role before adding events.".to_string())
    })?;

    let event = state
        .db
        .call(move |conn| {
            check_participants(conn, Some(department), &form.participants)?;
            let id = db::calendar::insert(conn, user.id(), department, &form)?;
            own_event(conn, &user, id)
        })
        .await?;

    tracing::info!(event_id = event.id, department_id = department, "Calendar event created");
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<EventForm>,
) -> Result<Json<CalendarEvent>> {
    user.require("dep_calendar.change_calendarevent")?;
    form.validate()?;

    state
        .db
        .call(move |conn| {
            own_event(conn, &user, id)?;
            check_participants(conn, user.activated_department(), &form.participants)?;
            db::calendar::update(conn, id, &form)?;
            own_event(conn, &user, id)
        })
        .await
        .map(Json)
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    user.require("dep_calendar.delete_calendarevent")?;
    state
        .db
        .call(move |conn| {
            own_event(conn, &user, id)?;
            Ok(db::calendar::delete(conn, id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::UserSummary;
    use chrono::NaiveDate;

    fn event(id: i64, username: &str) -> CalendarEvent {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        CalendarEvent {
            id,
            title: "Maintenance window".to_string(),
            description: String::new(),
            start_time: day.and_hms_opt(9, 0, 0).unwrap(),
            end_time: day.and_hms_opt(10, 30, 0).unwrap(),
            department_id: 1,
            participants: Vec::new(),
            created_by: UserSummary {
                id,
                username: username.to_string(),
                name: format!("{username} full"),
            },
        }
    }

    #[test]
    fn test_feed_entries_use_configured_colors() {
        let colors = HashMap::from([("rico_hu".to_string(), "#00FF00".to_string())]);
        let feed = feed_entries(&[event(1, "rico_hu"), event(2, "someone")], &colors);

        assert_eq!(feed[0].color, "#00FF00");
        assert_eq!(feed[1].color, DEFAULT_EVENT_COLOR);
        assert_eq!(feed[0].start, "2026-03-02T09:00:00");
        assert_eq!(feed[0].end, "2026-03-02T10:30:00");
        assert_eq!(feed[1].created_by, "someone full");
    }
}
