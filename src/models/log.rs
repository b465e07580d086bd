//! Audit log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::account::UserSummary;

/// `model_name` of entries written by diary operations.
pub const DIARY_MODEL: &str = "diary";
/// `model_name` of entries written by administrative actions.
pub const ADMIN_MODEL: &str = "pilotadmin";

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub model_name: String,
    pub object_id: Option<i64>,
    pub action: String,
    pub message: String,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

/// A log entry about to be written.
#[derive(Debug, Clone)]
pub struct NewLogEntry<'a> {
    pub model_name: &'a str,
    pub object_id: Option<i64>,
    pub action: &'a str,
    pub message: String,
    pub created_by: Option<i64>,
}
