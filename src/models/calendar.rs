//! Department calendar events.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::account::UserSummary;

/// Feed color for users without a configured one.
pub const DEFAULT_EVENT_COLOR: &str = "#808080";

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub department_id: i64,
    pub participants: Vec<UserSummary>,
    pub created_by: UserSummary,
}

/// One entry of the calendar JSON feed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeedEvent {
    pub id: i64,
    pub title: String,
    pub start: String,
    pub end: String,
    pub color: String,
    pub created_by: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_event_times"))]
pub struct EventForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub participants: Vec<i64>,
}

fn validate_event_times(form: &EventForm) -> Result<(), ValidationError> {
    if form.end_time < form.start_time {
        return Err(ValidationError::new("end_before_start")
            .with_message("The end time must not be before the start time.".into()));
    }
    Ok(())
}
