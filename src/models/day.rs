//! Holiday calendar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A calendar day that deviates from the normal Mon-Fri week.
///
/// Holidays drop a weekday from diary obligations, non-holidays add a
/// working weekend day.
#[derive(Debug, Clone, Serialize)]
pub struct Day {
    pub id: i64,
    pub date: NaiveDate,
    pub is_holiday: bool,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DayForm {
    pub date: NaiveDate,
    #[serde(default = "default_true")]
    pub is_holiday: bool,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
}

fn default_true() -> bool {
    true
}
