// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Department calendar events.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::accounts::{summary_at, SUMMARY_COLUMNS};
use crate::models::account::UserSummary;
use crate::models::calendar::{CalendarEvent, EventForm};
use crate::services::access::RecordScope;

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<CalendarEvent> {
    Ok(CalendarEvent {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        department_id: row.get(5)?,
        participants: Vec::new(),
        created_by: summary_at(row, 6)?,
    })
}

fn participants(conn: &Connection, event_id: i64) -> rusqlite::Result<Vec<UserSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM calendar_event_participants p
         JOIN users u ON u.id = p.user_id WHERE p.event_id = ?1 ORDER BY u.id"
    ))?;
    let rows = stmt.query_map([event_id], |row| summary_at(row, 0))?;
    rows.collect()
}

fn query(conn: &Connection, filter: &str, values: Vec<Value>) -> rusqlite::Result<Vec<CalendarEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT e.id, e.title, e.description, e.start_time, e.end_time, e.department_id,
                {SUMMARY_COLUMNS}
         FROM calendar_events e JOIN users u ON u.id = e.created_by
         WHERE {filter} ORDER BY e.start_time, e.id"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), event_from_row)?;
    let mut events = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    for event in &mut events {
        event.participants = participants(conn, event.id)?;
    }
    Ok(events)
}

/// Events of one department in start order.
pub fn list_for_department(conn: &Connection, department_id: i64) -> rusqlite::Result<Vec<CalendarEvent>> {
    query(conn, "e.department_id = ?", vec![Value::Integer(department_id)])
}

/// An event whose department is `department`, or, without one, whose
/// creator is inside `scope`.
pub fn get(
    conn: &Connection,
    id: i64,
    department: Option<i64>,
    scope: &RecordScope,
) -> rusqlite::Result<Option<CalendarEvent>> {
    let events = match department {
        Some(dep) => query(
            conn,
            "e.id = ? AND e.department_id = ?",
            vec![Value::Integer(id), Value::Integer(dep)],
        )?,
        None => {
            let (cond, mut values) = scope.sql("e.created_by");
            values.insert(0, Value::Integer(id));
            query(conn, &format!("e.id = ? AND {cond}"), values)?
        }
    };
    Ok(events.into_iter().next())
}

fn set_participants(conn: &Connection, event_id: i64, users: &[i64]) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM calendar_event_participants WHERE event_id = ?1",
        [event_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO calendar_event_participants (event_id, user_id) VALUES (?1, ?2)",
    )?;
    for user in users {
        stmt.execute(params![event_id, user])?;
    }
    Ok(())
}

pub fn insert(
    conn: &Connection,
    created_by: i64,
    department_id: i64,
    form: &EventForm,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO calendar_events (title, description, start_time, end_time, created_by, department_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            form.title,
            form.description,
            form.start_time,
            form.end_time,
            created_by,
            department_id,
        ],
    )?;
    let id = conn.last_insert_rowid();
    set_participants(conn, id, &form.participants)?;
    Ok(id)
}

pub fn update(conn: &Connection, id: i64, form: &EventForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE calendar_events SET title = ?2, description = ?3, start_time = ?4, end_time = ?5
         WHERE id = ?1",
        params![id, form.title, form.description, form.start_time, form.end_time],
    )?;
    set_participants(conn, id, &form.participants)
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM calendar_events WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_department, seed_user};
    use crate::db::Db;

    fn form(title: &str, start: &str, participants: Vec<i64>) -> EventForm {
        let start: chrono::NaiveDateTime = start.parse().unwrap();
        EventForm {
            title: title.to_string(),
            description: String::new(),
            start_time: start,
            end_time: start + chrono::Duration::hours(1),
            participants,
        }
    }

    #[tokio::test]
    async fn test_department_events_with_participants() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let alice = seed_user(conn, "alice");
            let bob = seed_user(conn, "bob");
            let i01 = seed_department(conn, "I01");
            let i02 = seed_department(conn, "I02");

            let late = insert(conn, alice, i01, &form("Review", "2024-05-02T10:00:00", vec![bob]))?;
            insert(conn, alice, i01, &form("Standup", "2024-05-01T09:00:00", vec![]))?;
            insert(conn, bob, i02, &form("Other", "2024-05-01T09:00:00", vec![]))?;

            let events = list_for_department(conn, i01)?;
            assert_eq!(
                events.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
                vec!["Standup", "Review"]
            );
            assert_eq!(events[1].participants[0].username, "bob");

            assert!(get(conn, late, Some(i02), &RecordScope::Owner(alice))?.is_none());
            assert!(get(conn, late, None, &RecordScope::Owner(alice))?.is_some());

            update(conn, late, &form("Review", "2024-05-02T10:00:00", vec![alice, bob]))?;
            let updated = get(conn, late, Some(i01), &RecordScope::Owner(alice))?.unwrap();
            assert_eq!(updated.participants.len(), 2);
            Ok(())
        })
        .await
        .unwrap();
    }
}
