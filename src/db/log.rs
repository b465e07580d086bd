// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audit log.

use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value, Connection, Row};

use super::accounts::{optional_summary_at, SUMMARY_COLUMNS};
use crate::models::log::{LogEntry, NewLogEntry};
use crate::services::access::RecordScope;

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        model_name: row.get(1)?,
        object_id: row.get(2)?,
        action: row.get(3)?,
        message: row.get(4)?,
        created_at: row.get(5)?,
        created_by: optional_summary_at(row, 6)?,
    })
}

pub fn insert(conn: &Connection, entry: &NewLogEntry<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO logs (model_name, object_id, action, message, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.model_name,
            entry.object_id,
            entry.action,
            entry.message,
            entry.created_by,
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Entries for one model, newest first, optionally limited by creator scope.
pub fn list(
    conn: &Connection,
    model_name: &str,
    scope: Option<&RecordScope>,
) -> rusqlite::Result<Vec<LogEntry>> {
    let mut sql = format!(
        "SELECT l.id, l.model_name, l.object_id, l.action, l.message, l.created_at, {SUMMARY_COLUMNS}
         FROM logs l LEFT JOIN users u ON u.id = l.created_by
         WHERE l.model_name = ?"
    );
    let mut values = vec![Value::Text(model_name.to_string())];
    if let Some(scope) = scope {
        let (cond, params) = scope.sql("l.created_by");
        sql.push_str(&format!(" AND {cond}"));
        values.extend(params);
    }
    sql.push_str(" ORDER BY l.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), entry_from_row)?;
    rows.collect()
}
