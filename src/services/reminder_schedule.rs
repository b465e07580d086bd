// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deciding which reminders are due and mailing them.
//!
//! The job runs once an hour. Hourly reminders go out on every run, every
//! other policy only on the run at the configured daily hour.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::db::{self, Db};
use crate::error::AppError;
use crate::models::reminder::{Reminder, ReminderPolicy};
use crate::services::mailer::{MailError, Mailer, OutgoingMail};
use crate::validators::split_separated;

/// Whether `reminder` should be sent on the run at `today` / `hour`.
pub fn is_due(reminder: &Reminder, today: NaiveDate, hour: u32, daily_hour: u32) -> bool {
    if !reminder.is_active {
        return false;
    }
    let in_range = reminder.start_at <= today && today < reminder.end_at;

    if reminder.policy == ReminderPolicy::Hourly {
        return in_range;
    }
    if hour != daily_hour {
        return false;
    }

    match reminder.policy {
        ReminderPolicy::Daily => in_range,
        ReminderPolicy::OnWeekdays => {
            in_range && !matches!(today.weekday(), Weekday::Sat | Weekday::Sun)
        }
        ReminderPolicy::Once => reminder.start_at <= today,
        ReminderPolicy::SpecifiedDates => {
            let today = today.to_string();
            split_separated(&reminder.specified_dates, ',')
                .iter()
                .any(|date| *date == today)
        }
        policy => in_range && policy.weekday() == Some(today.weekday()),
    }
}

/// The reminder as a plain text mail to its recipients.
pub fn reminder_mail(reminder: &Reminder, from: &str) -> OutgoingMail {
    OutgoingMail {
        from: from.to_string(),
        to: split_separated(&reminder.recipients, ';'),
        subject: reminder.email_subject.clone(),
        text: reminder.email_content.clone(),
        ..Default::default()
    }
}

pub async fn send_reminder(
    mailer: &dyn Mailer,
    reminder: &Reminder,
    from: &str,
) -> Result<(), MailError> {
    mailer.send(&reminder_mail(reminder, from)).await?;
    tracing::info!(
        reminder_id = reminder.id,
        event = %reminder.event,
        recipients = %reminder.recipients,
        "Reminder sent"
    );
    Ok(())
}

/// Outcome of one scheduler run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReminderRun {
    pub sent: Vec<i64>,
    pub failed: Vec<i64>,
}

/// Send every reminder due at local time `now`.
///
/// A failed send is logged and the run continues. Sent `once` reminders
/// are deactivated.
pub async fn send_due_reminders(
    db: &Db,
    mailer: &dyn Mailer,
    from: &str,
    daily_hour: u32,
    now: NaiveDateTime,
) -> Result<ReminderRun, AppError> {
    let today = now.date();
    let hour = now.hour();
    let due: Vec<Reminder> = db
        .call(|conn| Ok(db::reminder::active(conn)?))
        .await?
        .into_iter()
        .filter(|r| is_due(r, today, hour, daily_hour))
        .collect();

    tracing::info!(%today, hour, due = due.len(), "Sending due reminders");

    let mut run = ReminderRun::default();
    for reminder in due {
        match send_reminder(mailer, &reminder, from).await {
            Ok(()) => {
                if reminder.policy == ReminderPolicy::Once {
                    let id = reminder.id;
                    db.call(move |conn| Ok(db::reminder::set_active(conn, id, false)?))
                        .await?;
                }
                run.sent.push(reminder.id);
            }
            Err(e) => {
                tracing::error!(reminder_id = reminder.id, error = %e, "Failed to send reminder");
                run.failed.push(reminder.id);
            }
        }
    }
    Ok(run)
}
