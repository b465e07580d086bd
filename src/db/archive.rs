// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Company document archive.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::accounts::{summary_at, SUMMARY_COLUMNS};
use crate::models::archive::{Archive, ArchiveType};

fn archive_from_row(row: &Row<'_>) -> rusqlite::Result<Archive> {
    let kind: String = row.get(3)?;
    let archive_type = ArchiveType::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown archive type {kind:?}").into(),
        )
    })?;
    Ok(Archive {
        id: row.get(0)?,
        name: row.get(1)?,
        file_path: row.get(2)?,
        archive_type,
        created_at: row.get(4)?,
        created_by: summary_at(row, 5)?,
    })
}

fn select() -> String {
    format!(
        "SELECT a.id, a.name, a.file_path, a.type, a.created_at, {SUMMARY_COLUMNS}
         FROM archives a JOIN users u ON u.id = a.created_by"
    )
}

/// Archives of one type, newest first.
pub fn list(conn: &Connection, archive_type: ArchiveType) -> rusqlite::Result<Vec<Archive>> {
    let mut stmt = conn.prepare(&format!("{} WHERE a.type = ?1 ORDER BY a.id DESC", select()))?;
    let rows = stmt.query_map([archive_type.as_str()], archive_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Archive>> {
    conn.query_row(&format!("{} WHERE a.id = ?1", select()), [id], archive_from_row)
        .optional()
}

pub fn insert(
    conn: &Connection,
    created_by: i64,
    archive_type: ArchiveType,
    name: &str,
    file_path: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO archives (file_path, name, type, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![file_path, name, archive_type.as_str(), created_by, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn rename(conn: &Connection, id: i64, name: &str) -> rusqlite::Result<()> {
    conn.execute("UPDATE archives SET name = ?2 WHERE id = ?1", params![id, name])?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM archives WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seed_user;
    use crate::db::Db;

    #[tokio::test]
    async fn test_list_by_type() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let vicky = seed_user(conn, "vicky");
            insert(conn, vicky, ArchiveType::Files, "Q1 report", "archive/a.pdf")?;
            let id = insert(conn, vicky, ArchiveType::Announce, "Holiday notice", "archive/b.pdf")?;

            assert_eq!(list(conn, ArchiveType::Files)?.len(), 1);
            rename(conn, id, "Holiday notice 2024")?;
            let got = get(conn, id)?.unwrap();
            assert_eq!(got.archive_type, ArchiveType::Announce);
            assert_eq!(got.full_filename(), "Holiday notice 2024.pdf");

            delete(conn, id)?;
            assert!(list(conn, ArchiveType::Announce)?.is_empty());
            Ok(())
        })
        .await
        .unwrap();
    }
}
