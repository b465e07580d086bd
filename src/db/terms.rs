// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Glossary terms and tool bookmarks.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::accounts::{optional_summary_at, SUMMARY_COLUMNS};
use crate::models::terms::{Term, TermForm, Tool, ToolForm};

fn term_from_row(row: &Row<'_>) -> rusqlite::Result<Term> {
    let url: Option<String> = row.get(3)?;
    Ok(Term {
        id: row.get(0)?,
        short_name: row.get(1)?,
        full_name: row.get(2)?,
        has_external_link: url.as_deref().is_some_and(|u| !u.is_empty()),
        url,
        management_department: row.get(4)?,
        description: row.get(5)?,
        created_by: optional_summary_at(row, 6)?,
    })
}

fn term_select() -> String {
    format!(
        "SELECT t.id, t.short_name, t.full_name, t.url, t.management_department, t.description,
                {SUMMARY_COLUMNS}
         FROM terms t LEFT JOIN users u ON u.id = t.created_by"
    )
}

pub fn list_terms(conn: &Connection) -> rusqlite::Result<Vec<Term>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY t.id DESC", term_select()))?;
    let rows = stmt.query_map([], term_from_row)?;
    rows.collect()
}

pub fn get_term(conn: &Connection, id: i64) -> rusqlite::Result<Option<Term>> {
    conn.query_row(&format!("{} WHERE t.id = ?1", term_select()), [id], term_from_row)
        .optional()
}

pub fn insert_term(conn: &Connection, created_by: i64, form: &TermForm) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO terms (short_name, full_name, url, management_department, description, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            form.short_name,
            form.full_name,
            form.url,
            form.management_department,
            form.description,
            created_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_term(conn: &Connection, id: i64, form: &TermForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE terms SET short_name = ?2, full_name = ?3, url = ?4, management_department = ?5,
                description = ?6
         WHERE id = ?1",
        params![
            id,
            form.short_name,
            form.full_name,
            form.url,
            form.management_department,
            form.description,
        ],
    )?;
    Ok(())
}

pub fn delete_term(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM terms WHERE id = ?1", [id])?;
    Ok(())
}

fn tool_from_row(row: &Row<'_>) -> rusqlite::Result<Tool> {
    Ok(Tool {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        created_by: optional_summary_at(row, 3)?,
    })
}

fn tool_select() -> String {
    format!(
        "SELECT t.id, t.name, t.url, {SUMMARY_COLUMNS}
         FROM tools t LEFT JOIN users u ON u.id = t.created_by"
    )
}

pub fn list_tools(conn: &Connection) -> rusqlite::Result<Vec<Tool>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY t.id DESC", tool_select()))?;
    let rows = stmt.query_map([], tool_from_row)?;
    rows.collect()
}

pub fn get_tool(conn: &Connection, id: i64) -> rusqlite::Result<Option<Tool>> {
    conn.query_row(&format!("{} WHERE t.id = ?1", tool_select()), [id], tool_from_row)
        .optional()
}

pub fn insert_tool(conn: &Connection, created_by: i64, form: &ToolForm) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO tools (name, url, created_by) VALUES (?1, ?2, ?3)",
        params![form.name, form.url, created_by],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_tool(conn: &Connection, id: i64, form: &ToolForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE tools SET name = ?2, url = ?3 WHERE id = ?1",
        params![id, form.name, form.url],
    )?;
    Ok(())
}

pub fn delete_tool(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM tools WHERE id = ?1", [id])?;
    Ok(())
}
