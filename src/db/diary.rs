// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Diary storage.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row};

use super::accounts::{summary_at, SUMMARY_COLUMNS};
use crate::models::diary::{Diary, DiaryFilter, DiaryForm};
use crate::services::access::RecordScope;

const SELECT: &str = "SELECT d.id, d.date, d.content, d.todo, d.remark, d.comment, d.created_at, d.updated_at";

fn diary_from_row(row: &Row<'_>) -> rusqlite::Result<Diary> {
    Ok(Diary {
        id: row.get(0)?,
        date: row.get(1)?,
        content: row.get(2)?,
        todo: row.get(3)?,
        remark: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        created_by: summary_at(row, 8)?,
    })
}

/// Diaries visible in `scope`, newest date first.
pub fn list(
    conn: &Connection,
    scope: &RecordScope,
    filter: &DiaryFilter,
) -> rusqlite::Result<Vec<Diary>> {
    let (cond, mut values) = scope.sql("d.created_by");
    let mut sql = format!(
        "{SELECT}, {SUMMARY_COLUMNS} FROM diaries d JOIN users u ON u.id = d.created_by WHERE {cond}"
    );

    if let Some(dep) = filter.dep.as_deref().filter(|d| !d.is_empty()) {
        sql.push_str(
            " AND d.created_by IN (SELECT ug.user_id FROM user_groups ug
               JOIN groups g ON g.id = ug.group_id WHERE g.name = ?)",
        );
        values.push(Value::Text(dep.to_string()));
    }
    if let Some(member) = filter.member {
        sql.push_str(" AND d.created_by = ?");
        values.push(Value::Integer(member));
    }
    if let Some(search) = filter.search_input.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        sql.push_str(" AND (instr(d.content, ?) > 0 OR instr(d.todo, ?) > 0 OR instr(d.remark, ?) > 0)");
        for _ in 0..3 {
            values.push(Value::Text(search.to_string()));
        }
    }
    sql.push_str(" ORDER BY d.date DESC, d.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), diary_from_row)?;
    rows.collect()
}

/// A diary by id, if it is inside `scope`.
pub fn get(conn: &Connection, id: i64, scope: &RecordScope) -> rusqlite::Result<Option<Diary>> {
    let (cond, mut values) = scope.sql("d.created_by");
    values.insert(0, Value::Integer(id));
    conn.query_row(
        &format!(
            "{SELECT}, {SUMMARY_COLUMNS} FROM diaries d JOIN users u ON u.id = d.created_by
             WHERE d.id = ? AND {cond}"
        ),
        params_from_iter(values),
        diary_from_row,
    )
    .optional()
}

pub fn insert(conn: &Connection, created_by: i64, form: &DiaryForm) -> rusqlite::Result<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO diaries (date, content, todo, remark, comment, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, '', ?5, ?6, ?6)",
        params![form.date, form.content, form.todo, form.remark, created_by, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, form: &DiaryForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE diaries SET date = ?2, content = ?3, todo = ?4, remark = ?5, updated_at = ?6
         WHERE id = ?1",
        params![id, form.date, form.content, form.todo, form.remark, Utc::now()],
    )?;
    Ok(())
}

pub fn set_comment(conn: &Connection, id: i64, comment: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE diaries SET comment = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, comment, Utc::now()],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM diaries WHERE id = ?1", [id])?;
    Ok(())
}

/// Copy a diary to `date` with the supervisor comment cleared.
pub fn clone_to(conn: &Connection, id: i64, date: NaiveDate) -> rusqlite::Result<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO diaries (date, content, todo, remark, comment, created_by, created_at, updated_at)
         SELECT ?2, content, todo, remark, '', created_by, ?3, ?3 FROM diaries WHERE id = ?1",
        params![id, date, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Every (author, date) pair that has a diary.
pub fn written_dates(conn: &Connection) -> rusqlite::Result<HashSet<(i64, NaiveDate)>> {
    let mut stmt = conn.prepare("SELECT created_by, date FROM diaries")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_department, seed_user};
    use crate::db::{accounts, Db};

    fn form(date: &str, content: &str) -> DiaryForm {
        DiaryForm {
            date: date.parse().unwrap(),
            content: content.to_string(),
            todo: "follow up".to_string(),
            remark: String::new(),
        }
    }

    #[tokio::test]
    async fn test_scope_and_filters() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let alice = seed_user(conn, "alice");
            let bob = seed_user(conn, "bob");
            let team = seed_department(conn, "I01");
            accounts::add_user_to_group(conn, bob, team)?;

            insert(conn, alice, &form("2024-05-01", "router swap"))?;
            insert(conn, bob, &form("2024-05-02", "BGP session review"))?;
            insert(conn, bob, &form("2024-05-03", "inventory"))?;

            let none = DiaryFilter::default();
            assert_eq!(list(conn, &RecordScope::Owner(alice), &none)?.len(), 1);

            let team_scope = RecordScope::MembersOf(vec![team]);
            let team_list = list(conn, &team_scope, &none)?;
            assert_eq!(team_list.len(), 2);
            assert_eq!(team_list[0].date.to_string(), "2024-05-03");

            let search = DiaryFilter {
                search_input: Some("BGP".to_string()),
                ..Default::default()
            };
            assert_eq!(list(conn, &team_scope, &search)?.len(), 1);

            let by_dep = DiaryFilter {
                dep: Some("I01".to_string()),
                ..Default::default()
            };
            let all = RecordScope::MembersOf(vec![team]);
            assert_eq!(list(conn, &all, &by_dep)?.len(), 2);
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_clone_clears_comment() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let alice = seed_user(conn, "alice");
            let id = insert(conn, alice, &form("2024-05-01", "router swap"))?;
            set_comment(conn, id, "good work")?;

            let copy = clone_to(conn, id, "2024-05-06".parse().unwrap())?;
            let scope = RecordScope::Owner(alice);
            let copied = get(conn, copy, &scope)?.unwrap();
            assert_eq!(copied.comment, "");
            assert_eq!(copied.content, "router swap");
            assert_eq!(copied.date.to_string(), "2024-05-06");

            assert!(get(conn, id, &RecordScope::Owner(alice + 100))?.is_none());
            assert_eq!(written_dates(conn)?.len(), 2);
            Ok(())
        })
        .await
        .unwrap();
    }
}
