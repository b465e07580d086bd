// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Holidays and extra working days.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::day::{Day, DayForm};

fn day_from_row(row: &Row<'_>) -> rusqlite::Result<Day> {
    Ok(Day {
        id: row.get(0)?,
        date: row.get(1)?,
        is_holiday: row.get(2)?,
        description: row.get(3)?,
    })
}

/// All days, newest first; `year` limits to one calendar year.
pub fn list(conn: &Connection, year: Option<i32>) -> rusqlite::Result<Vec<Day>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, is_holiday, description FROM days
         WHERE ?1 IS NULL OR substr(date, 1, 4) = printf('%04d', ?1)
         ORDER BY date DESC",
    )?;
    let rows = stmt.query_map([year], day_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Day>> {
    conn.query_row(
        "SELECT id, date, is_holiday, description FROM days WHERE id = ?1",
        [id],
        day_from_row,
    )
    .optional()
}

pub fn date_taken(conn: &Connection, date: NaiveDate, except: Option<i64>) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM days WHERE date = ?1 AND (?2 IS NULL OR id <> ?2))",
        params![date, except],
        |row| row.get(0),
    )
}

pub fn insert(conn: &Connection, form: &DayForm) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO days (date, is_holiday, description) VALUES (?1, ?2, ?3)",
        params![form.date, form.is_holiday, form.description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, form: &DayForm) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE days SET date = ?2, is_holiday = ?3, description = ?4 WHERE id = ?1",
        params![id, form.date, form.is_holiday, form.description],
    )?;
    Ok(changed > 0)
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    Ok(conn.execute("DELETE FROM days WHERE id = ?1", [id])? > 0)
}

/// Holiday dates and extra working dates, in that order.
pub fn exceptions(conn: &Connection) -> rusqlite::Result<(HashSet<NaiveDate>, HashSet<NaiveDate>)> {
    let mut holidays = HashSet::new();
    let mut workdays = HashSet::new();
    for day in list(conn, None)? {
        if day.is_holiday {
            holidays.insert(day.date);
        } else {
            workdays.insert(day.date);
        }
    }
    Ok((holidays, workdays))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn form(date: &str, is_holiday: bool) -> DayForm {
        DayForm {
            date: date.parse().unwrap(),
            is_holiday,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_list_by_year_and_exceptions() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            insert(conn, &form("2023-12-25", true))?;
            let id = insert(conn, &form("2024-02-28", true))?;
            insert(conn, &form("2024-02-17", false))?;

            assert_eq!(list(conn, None)?.len(), 3);
            let this_year = list(conn, Some(2024))?;
            assert_eq!(this_year.len(), 2);
            assert_eq!(this_year[0].id, id);

            let (holidays, workdays) = exceptions(conn)?;
            assert_eq!(holidays.len(), 2);
            assert!(workdays.contains(&"2024-02-17".parse().unwrap()));

            assert!(date_taken(conn, "2024-02-28".parse().unwrap(), None)?);
            assert!(!date_taken(conn, "2024-02-28".parse().unwrap(), Some(id))?);
            assert!(delete(conn, id)?);
            assert!(get(conn, id)?.is_none());
            Ok(())
        })
        .await
        .unwrap();
    }
}
