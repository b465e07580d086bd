// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! News posts.

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row};

use super::accounts::{optional_summary_at, SUMMARY_COLUMNS};
use super::placeholders;
use crate::models::news::{News, NewsForm};

fn news_from_row(row: &Row<'_>) -> rusqlite::Result<News> {
    Ok(News {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        is_pinned: row.get(3)?,
        at: row.get(4)?,
        due: row.get(5)?,
        created_by: optional_summary_at(row, 6)?,
    })
}

fn select() -> String {
    format!(
        "SELECT n.id, n.title, n.content, n.is_pinned, n.at, n.due, {SUMMARY_COLUMNS}
         FROM news n LEFT JOIN users u ON u.id = n.created_by"
    )
}

/// All posts, newest publication date first.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<News>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY n.at DESC, n.id DESC", select()))?;
    let rows = stmt.query_map([], news_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<News>> {
    conn.query_row(&format!("{} WHERE n.id = ?1", select()), [id], news_from_row)
        .optional()
}

/// Posts pinned on `today`, limited to `authors` unless it is empty.
pub fn pinned(conn: &Connection, today: NaiveDate, authors: &[i64]) -> rusqlite::Result<Vec<News>> {
    let mut sql = format!(
        "{} WHERE n.is_pinned = 1 AND n.at <= ? AND (n.due IS NULL OR n.due >= ?)",
        select()
    );
    let mut values = vec![Value::Text(today.to_string()), Value::Text(today.to_string())];
    if !authors.is_empty() {
        sql.push_str(&format!(" AND n.created_by IN ({})", placeholders(authors.len())));
        values.extend(authors.iter().map(|id| Value::Integer(*id)));
    }
    sql.push_str(" ORDER BY n.at DESC, n.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), news_from_row)?;
    rows.collect()
}

pub fn insert(conn: &Connection, created_by: i64, form: &NewsForm) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO news (title, content, is_pinned, at, due, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![form.title, form.content, form.is_pinned, form.at, form.due, created_by],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, form: &NewsForm) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE news SET title = ?2, content = ?3, is_pinned = ?4, at = ?5, due = ?6 WHERE id = ?1",
        params![id, form.title, form.content, form.is_pinned, form.at, form.due],
    )?;
    Ok(changed > 0)
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    Ok(conn.execute("DELETE FROM news WHERE id = ?1", [id])? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seed_user;
    use crate::db::Db;

    fn form(title: &str, at: &str, pinned: bool, due: Option<&str>) -> NewsForm {
        NewsForm {
            title: title.to_string(),
            content: String::new(),
            is_pinned: pinned,
            at: at.parse().unwrap(),
            due: due.map(|d| d.parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn test_pinned_window_and_authors() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let ceo = seed_user(conn, "ceo");
            let staff = seed_user(conn, "staff");
            insert(conn, ceo, &form("Office move", "2024-05-01", true, Some("2024-05-31")))?;
            insert(conn, ceo, &form("Old notice", "2024-04-01", true, Some("2024-04-30")))?;
            insert(conn, staff, &form("Lunch", "2024-05-02", true, None))?;
            insert(conn, ceo, &form("Unpinned", "2024-05-03", false, None))?;

            let today = "2024-05-10".parse().unwrap();
            let all = pinned(conn, today, &[])?;
            assert_eq!(
                all.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
                vec!["Lunch", "Office move"]
            );
            let from_ceo = pinned(conn, today, &[ceo])?;
            assert_eq!(from_ceo.len(), 1);
            assert!(from_ceo.iter().all(|n| n.is_pinned_on(today)));

            assert_eq!(list(conn)?.len(), 4);
            Ok(())
        })
        .await
        .unwrap();
    }
}
