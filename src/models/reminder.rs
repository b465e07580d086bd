//! Mail reminders and their recurrence policies.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::UserSummary;
use crate::error::AppError;
use crate::validators::parse_date_list;

/// How often a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderPolicy {
    #[serde(rename = "once")]
    Once,
    #[serde(rename = "hourly")]
    Hourly,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "on weekdays")]
    OnWeekdays,
    #[serde(rename = "every monday")]
    EveryMonday,
    #[serde(rename = "every tuesday")]
    EveryTuesday,
    #[serde(rename = "every wednesday")]
    EveryWednesday,
    #[serde(rename = "every thursday")]
    EveryThursday,
    #[serde(rename = "every friday")]
    EveryFriday,
    #[serde(rename = "every saturday")]
    EverySaturday,
    #[serde(rename = "every sunday")]
    EverySunday,
    #[serde(rename = "specified dates")]
    SpecifiedDates,
}

impl ReminderPolicy {
    pub const ALL: [ReminderPolicy; 12] = [
        Self::Once,
        Self::Hourly,
        Self::Daily,
        Self::OnWeekdays,
        Self::EveryMonday,
        Self::EveryTuesday,
        Self::EveryWednesday,
        Self::EveryThursday,
        Self::EveryFriday,
        Self::EverySaturday,
        Self::EverySunday,
        Self::SpecifiedDates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::OnWeekdays => "on weekdays",
            Self::EveryMonday => "every monday",
            Self::EveryTuesday => "every tuesday",
            Self::EveryWednesday => "every wednesday",
            Self::EveryThursday => "every thursday",
            Self::EveryFriday => "every friday",
            Self::EverySaturday => "every saturday",
            Self::EverySunday => "every sunday",
            Self::SpecifiedDates => "specified dates",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }

    /// The weekday of an `every <weekday>` policy.
    pub fn weekday(self) -> Option<Weekday> {
        match self {
            Self::EveryMonday => Some(Weekday::Mon),
            Self::EveryTuesday => Some(Weekday::Tue),
            Self::EveryWednesday => Some(Weekday::Wed),
            Self::EveryThursday => Some(Weekday::Thu),
            Self::EveryFriday => Some(Weekday::Fri),
            Self::EverySaturday => Some(Weekday::Sat),
            Self::EverySunday => Some(Weekday::Sun),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub id: i64,
    pub event: String,
    pub policy: ReminderPolicy,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    pub specified_dates: String,
    pub email_subject: String,
    pub email_content: String,
    /// `;` separated addresses
    pub recipients: String,
    pub is_active: bool,
    pub created_by: UserSummary,
}

/// Reminder fields as written to storage.
#[derive(Debug, Clone)]
pub struct ReminderDraft {
    pub event: String,
    pub policy: ReminderPolicy,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    pub specified_dates: String,
    pub email_subject: String,
    pub email_content: String,
    pub recipients: String,
    pub is_active: bool,
}

impl From<&Reminder> for ReminderDraft {
    fn from(r: &Reminder) -> Self {
        Self {
            event: r.event.clone(),
            policy: r.policy,
            start_at: r.start_at,
            end_at: r.end_at,
            specified_dates: r.specified_dates.clone(),
            email_subject: r.email_subject.clone(),
            email_content: r.email_content.clone(),
            recipients: r.recipients.clone(),
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReminderForm {
    #[validate(length(min = 1, max = 255))]
    pub event: String,
    pub policy: ReminderPolicy,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    #[serde(default)]
    #[validate(custom(function = "crate::validators::date_list_field"))]
    pub specified_dates: String,
    #[validate(length(min = 1, max = 255))]
    pub email_subject: String,
    #[serde(default)]
    pub email_content: String,
    #[validate(
        length(min = 1, message = "This field is required."),
        custom(function = "crate::validators::email_list_field")
    )]
    pub recipients: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ReminderForm {
    /// Validate and normalize the date range for the chosen policy.
    ///
    /// `specified dates` spans the listed dates, `once` collapses to its
    /// start date.
    pub fn clean(self) -> Result<ReminderDraft, AppError> {
        self.validate()?;

        let (mut start_at, mut end_at) = (self.start_at, self.end_at);
        match self.policy {
            ReminderPolicy::SpecifiedDates => {
                let dates = parse_date_list(&self.specified_dates)
                    .map_err(|msg| AppError::field("specified_dates", msg))?;
                if let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) {
                    start_at = *min;
                    end_at = *max;
                }
            }
            ReminderPolicy::Once => end_at = start_at,
            _ => {}
        }

        Ok(ReminderDraft {
            event: self.event,
            policy: self.policy,
            start_at,
            end_at,
            specified_dates: self.specified_dates,
            email_subject: self.email_subject,
            email_content: self.email_content,
            recipients: self.recipients,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderFilter {
    /// Any non-empty value restricts the list to the caller's reminders
    pub created_by: Option<String>,
}
