// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mail reminders.

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::accounts::{summary_at, SUMMARY_COLUMNS};
use crate::models::reminder::{Reminder, ReminderDraft, ReminderPolicy};
use crate::services::access::RecordScope;

const SELECT: &str = "SELECT r.id, r.event, r.policy, r.start_at, r.end_at, r.specified_dates,
    r.email_subject, r.email_content, r.recipients, r.is_active";

fn reminder_from_row(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    let policy: String = row.get(2)?;
    let policy = ReminderPolicy::parse(&policy).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown reminder policy {policy:?}").into(),
        )
    })?;
    Ok(Reminder {
        id: row.get(0)?,
        event: row.get(1)?,
        policy,
        start_at: row.get(3)?,
        end_at: row.get(4)?,
        specified_dates: row.get(5)?,
        email_subject: row.get(6)?,
        email_content: row.get(7)?,
        recipients: row.get(8)?,
        is_active: row.get(9)?,
        created_by: summary_at(row, 10)?,
    })
}

/// Reminders in `scope`, newest first. `owner` further limits to one creator.
pub fn list(
    conn: &Connection,
    scope: &RecordScope,
    owner: Option<i64>,
) -> rusqlite::Result<Vec<Reminder>> {
    let (cond, mut values) = scope.sql("r.created_by");
    let mut sql = format!(
        "{SELECT}, {SUMMARY_COLUMNS} FROM reminders r JOIN users u ON u.id = r.created_by WHERE {cond}"
    );
    if let Some(owner) = owner {
        sql.push_str(" AND r.created_by = ?");
        values.push(Value::Integer(owner));
    }
    sql.push_str(" ORDER BY r.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), reminder_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64, scope: &RecordScope) -> rusqlite::Result<Option<Reminder>> {
    let (cond, mut values) = scope.sql("r.created_by");
    values.insert(0, Value::Integer(id));
    conn.query_row(
        &format!(
            "{SELECT}, {SUMMARY_COLUMNS} FROM reminders r JOIN users u ON u.id = r.created_by
             WHERE r.id = ? AND {cond}"
        ),
        params_from_iter(values),
        reminder_from_row,
    )
    .optional()
}

/// Every active reminder regardless of creator, for the scheduler.
pub fn active(conn: &Connection) -> rusqlite::Result<Vec<Reminder>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT}, {SUMMARY_COLUMNS} FROM reminders r JOIN users u ON u.id = r.created_by
         WHERE r.is_active = 1 ORDER BY r.id"
    ))?;
    let rows = stmt.query_map([], reminder_from_row)?;
    rows.collect()
}

pub fn insert(conn: &Connection, created_by: i64, draft: &ReminderDraft) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO reminders (event, policy, start_at, end_at, specified_dates, email_subject,
                                email_content, recipients, is_active, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            draft.event,
            draft.policy.as_str(),
            draft.start_at,
            draft.end_at,
            draft.specified_dates,
            draft.email_subject,
            draft.email_content,
            draft.recipients,
            draft.is_active,
            created_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, draft: &ReminderDraft) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE reminders SET event = ?2, policy = ?3, start_at = ?4, end_at = ?5,
                specified_dates = ?6, email_subject = ?7, email_content = ?8,
                recipients = ?9, is_active = ?10
         WHERE id = ?1",
        params![
            id,
            draft.event,
            draft.policy.as_str(),
            draft.start_at,
            draft.end_at,
            draft.specified_dates,
            draft.email_subject,
            draft.email_content,
            draft.recipients,
            draft.is_active,
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM reminders WHERE id = ?1", [id])?;
    Ok(())
}

pub fn set_active(conn: &Connection, id: i64, active: bool) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE reminders SET is_active = ?2 WHERE id = ?1",
        params![id, active],
    )?;
    Ok(())
}
