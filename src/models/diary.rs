//! Work diaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct Diary {
    pub id: i64,
    pub date: NaiveDate,
    pub content: String,
    pub todo: String,
    pub remark: String,
    /// Supervisor comment
    pub comment: String,
    pub created_by: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for creating or updating a diary. The comment is not settable here.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DiaryForm {
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "This field is required."))]
    pub content: String,
    #[serde(default)]
    pub todo: String,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

/// Filters accepted by the diary list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiaryFilter {
    /// Only diaries by members of this group
    pub dep: Option<String>,
    /// Only diaries by this user
    pub member: Option<i64>,
    /// Substring of content, todo or remark
    pub search_input: Option<String>,
}
