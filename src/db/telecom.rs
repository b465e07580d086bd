// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ISPs, ISP groups, prefix-list tasks and their attachments.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::accounts::{summary_at, SUMMARY_COLUMNS};
use super::placeholders;
use crate::models::telecom::{
    FileKind, IpVersion, Isp, IspForm, IspGroup, IspGroupForm, IspRef, PrefixListTask, TaskFile,
    TaskForm, TelecomArchive, UpdateType,
};
use crate::services::access::RecordScope;

fn conversion_error(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown {what} {value:?}").into(),
    )
}

fn id_values(ids: &[i64]) -> impl Iterator<Item = Value> + '_ {
    ids.iter().map(|id| Value::Integer(*id))
}

// ─── ISPs ────────────────────────────────────────────────────

const ISP_COLUMNS: &str = "i.id, i.name, i.cname, i.customer_no, i.upstream_as, i.primary_contact,
    i.\"to\", i.cc, i.bcc, i.ip_version, i.upstream_session_ip, i.chief_session_ip, i.telephone,
    i.cellphone, i.subject, i.content, i.remark, i.eng_mail_type";

fn isp_from_row(row: &Row<'_>) -> rusqlite::Result<Isp> {
    let version: String = row.get(9)?;
    let ip_version =
        IpVersion::parse(&version).ok_or_else(|| conversion_error(9, "ip version", &version))?;
    Ok(Isp {
        id: row.get(0)?,
        name: row.get(1)?,
        cname: row.get(2)?,
        customer_no: row.get(3)?,
        upstream_as: row.get(4)?,
        primary_contact: row.get(5)?,
        to: row.get(6)?,
        cc: row.get(7)?,
        bcc: row.get(8)?,
        ip_version,
        upstream_session_ip: row.get(10)?,
        chief_session_ip: row.get(11)?,
        telephone: row.get(12)?,
        cellphone: row.get(13)?,
        subject: row.get(14)?,
        content: row.get(15)?,
        remark: row.get(16)?,
        eng_mail_type: row.get(17)?,
        created_by: summary_at(row, 18)?,
    })
}

fn query_isps(conn: &Connection, filter: &str, values: Vec<Value>) -> rusqlite::Result<Vec<Isp>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ISP_COLUMNS}, {SUMMARY_COLUMNS} FROM isps i JOIN users u ON u.id = i.created_by
         WHERE {filter} ORDER BY i.id DESC"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), isp_from_row)?;
    rows.collect()
}

pub fn list_isps(conn: &Connection, scope: &RecordScope) -> rusqlite::Result<Vec<Isp>> {
    let (cond, values) = scope.sql("i.created_by");
    query_isps(conn, &cond, values)
}

pub fn get_isp(conn: &Connection, id: i64, scope: &RecordScope) -> rusqlite::Result<Option<Isp>> {
    let (cond, mut values) = scope.sql("i.created_by");
    values.insert(0, Value::Integer(id));
    Ok(query_isps(conn, &format!("i.id = ? AND {cond}"), values)?
        .into_iter()
        .next())
}

/// How many of `ids` name ISPs inside `scope`.
pub fn count_isps_in_scope(conn: &Connection, scope: &RecordScope, ids: &[i64]) -> rusqlite::Result<usize> {
    count_in_scope(conn, "isps", scope, ids)
}

pub fn count_groups_in_scope(
    conn: &Connection,
    scope: &RecordScope,
    ids: &[i64],
) -> rusqlite::Result<usize> {
    count_in_scope(conn, "isp_groups", scope, ids)
}

fn count_in_scope(
    conn: &Connection,
    table: &str,
    scope: &RecordScope,
    ids: &[i64],
) -> rusqlite::Result<usize> {
    let unique: HashSet<i64> = ids.iter().copied().collect();
    if unique.is_empty() {
        return Ok(0);
    }
    let unique: Vec<i64> = unique.into_iter().collect();
    let (cond, scope_values) = scope.sql("created_by");
    let mut values: Vec<Value> = id_values(&unique).collect();
    values.extend(scope_values);
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {table} WHERE id IN ({}) AND {cond}",
            placeholders(unique.len())
        ),
        params_from_iter(values),
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as usize)
}

pub fn insert_isp(conn: &Connection, created_by: i64, form: &IspForm) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO isps (name, cname, customer_no, upstream_as, primary_contact, \"to\", cc, bcc,
                           ip_version, upstream_session_ip, chief_session_ip, telephone, cellphone,
                           subject, content, remark, eng_mail_type, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            form.name,
            form.cname,
            form.customer_no,
            form.upstream_as,
            form.primary_contact,
            form.to,
            form.cc,
            form.bcc,
            form.ip_version.as_str(),
            form.upstream_session_ip,
            form.chief_session_ip,
            form.telephone,
            form.cellphone,
            form.subject,
            form.content,
            form.remark,
            form.eng_mail_type,
            created_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_isp(conn: &Connection, id: i64, form: &IspForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE isps SET name = ?2, cname = ?3, customer_no = ?4, upstream_as = ?5,
                primary_contact = ?6, \"to\" = ?7, cc = ?8, bcc = ?9, ip_version = ?10,
                upstream_session_ip = ?11, chief_session_ip = ?12, telephone = ?13,
                cellphone = ?14, subject = ?15, content = ?16, remark = ?17, eng_mail_type = ?18
         WHERE id = ?1",
        params![
            id,
            form.name,
            form.cname,
            form.customer_no,
            form.upstream_as,
            form.primary_contact,
            form.to,
            form.cc,
            form.bcc,
            form.ip_version.as_str(),
            form.upstream_session_ip,
            form.chief_session_ip,
            form.telephone,
            form.cellphone,
            form.subject,
            form.content,
            form.remark,
            form.eng_mail_type,
        ],
    )?;
    Ok(())
}

pub fn delete_isp(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM isps WHERE id = ?1", [id])?;
    Ok(())
}

// ─── ISP groups ──────────────────────────────────────────────

fn group_members(conn: &Connection, group_id: i64) -> rusqlite::Result<Vec<IspRef>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.name FROM isp_group_members m JOIN isps i ON i.id = m.isp_id
         WHERE m.isp_group_id = ?1 ORDER BY i.id",
    )?;
    let rows = stmt.query_map([group_id], |row| {
        Ok(IspRef {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

fn query_groups(
    conn: &Connection,
    filter: &str,
    values: Vec<Value>,
) -> rusqlite::Result<Vec<IspGroup>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT g.id, g.name, g.remark, {SUMMARY_COLUMNS}
         FROM isp_groups g JOIN users u ON u.id = g.created_by
         WHERE {filter} ORDER BY g.id DESC"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(IspGroup {
            id: row.get(0)?,
            name: row.get(1)?,
            remark: row.get(2)?,
            isps: Vec::new(),
            created_by: summary_at(row, 3)?,
        })
    })?;
    let mut groups = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    for group in &mut groups {
        group.isps = group_members(conn, group.id)?;
    }
    Ok(groups)
}

pub fn list_groups(conn: &Connection, scope: &RecordScope) -> rusqlite::Result<Vec<IspGroup>> {
    let (cond, values) = scope.sql("g.created_by");
    query_groups(conn, &cond, values)
}

pub fn get_group(
    conn: &Connection,
    id: i64,
    scope: &RecordScope,
) -> rusqlite::Result<Option<IspGroup>> {
    let (cond, mut values) = scope.sql("g.created_by");
    values.insert(0, Value::Integer(id));
    Ok(query_groups(conn, &format!("g.id = ? AND {cond}"), values)?
        .into_iter()
        .next())
}

fn set_group_members(conn: &Connection, group_id: i64, isps: &[i64]) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM isp_group_members WHERE isp_group_id = ?1", [group_id])?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO isp_group_members (isp_group_id, isp_id) VALUES (?1, ?2)",
    )?;
    for isp in isps {
        stmt.execute(params![group_id, isp])?;
    }
    Ok(())
}

pub fn insert_group(conn: &Connection, created_by: i64, form: &IspGroupForm) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO isp_groups (name, remark, created_by) VALUES (?1, ?2, ?3)",
        params![form.name, form.remark, created_by],
    )?;
    let id = conn.last_insert_rowid();
    set_group_members(conn, id, &form.isps)?;
    Ok(id)
}

pub fn update_group(conn: &Connection, id: i64, form: &IspGroupForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE isp_groups SET name = ?2, remark = ?3 WHERE id = ?1",
        params![id, form.name, form.remark],
    )?;
    set_group_members(conn, id, &form.isps)
}

pub fn delete_group(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM isp_groups WHERE id = ?1", [id])?;
    Ok(())
}

/// Member ISP ids of every group in `scope`, for the task form.
pub fn group_isp_map(
    conn: &Connection,
    scope: &RecordScope,
) -> rusqlite::Result<BTreeMap<i64, Vec<i64>>> {
    let (cond, values) = scope.sql("g.created_by");
    let mut stmt = conn.prepare(&format!(
        "SELECT g.id, m.isp_id FROM isp_groups g
         LEFT JOIN isp_group_members m ON m.isp_group_id = g.id
         WHERE {cond} ORDER BY g.id, m.isp_id"
    ))?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut map: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let entry = map.entry(row.get(0)?).or_default();
        if let Some(isp) = row.get::<_, Option<i64>>(1)? {
            entry.push(isp);
        }
    }
    Ok(map)
}

// ─── Prefix-list tasks ───────────────────────────────────────

const TASK_COLUMNS: &str = "t.id, t.update_type, t.origin_as, t.as_path, t.ipv4_prefix_list,
    t.ipv6_prefix_list, t.subject_warning, t.related_ticket, t.loa_remark, t.remark,
    t.mail_sent_time";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<PrefixListTask> {
    let kind: String = row.get(1)?;
    let update_type =
        UpdateType::parse(&kind).ok_or_else(|| conversion_error(1, "update type", &kind))?;
    Ok(PrefixListTask {
        id: row.get(0)?,
        update_type,
        isps: Vec::new(),
        isp_groups: Vec::new(),
        origin_as: row.get(2)?,
        as_path: row.get(3)?,
        ipv4_prefix_list: row.get(4)?,
        ipv6_prefix_list: row.get(5)?,
        subject_warning: row.get(6)?,
        related_ticket: row.get(7)?,
        loa_remark: row.get(8)?,
        remark: row.get(9)?,
        mail_sent_time: row.get(10)?,
        files: Vec::new(),
        created_by: summary_at(row, 11)?,
    })
}

fn refs(conn: &Connection, sql: &str, task_id: i64) -> rusqlite::Result<Vec<IspRef>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([task_id], |row| {
        Ok(IspRef {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

fn load_task_relations(conn: &Connection, task: &mut PrefixListTask) -> rusqlite::Result<()> {
    task.isps = refs(
        conn,
        "SELECT i.id, i.name FROM task_isps ti JOIN isps i ON i.id = ti.isp_id
         WHERE ti.task_id = ?1 ORDER BY i.id",
        task.id,
    )?;
    task.isp_groups = refs(
        conn,
        "SELECT g.id, g.name FROM task_isp_groups tg JOIN isp_groups g ON g.id = tg.isp_group_id
         WHERE tg.task_id = ?1 ORDER BY g.id",
        task.id,
    )?;
    task.files = task_files(conn, task.id)?;
    Ok(())
}

fn query_tasks(
    conn: &Connection,
    filter: &str,
    values: Vec<Value>,
) -> rusqlite::Result<Vec<PrefixListTask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS}, {SUMMARY_COLUMNS}
         FROM prefix_list_tasks t JOIN users u ON u.id = t.created_by
         WHERE {filter} ORDER BY t.id DESC"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), task_from_row)?;
    let mut tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    for task in &mut tasks {
        load_task_relations(conn, task)?;
    }
    Ok(tasks)
}

pub fn list_tasks(conn: &Connection, scope: &RecordScope) -> rusqlite::Result<Vec<PrefixListTask>> {
    let (cond, values) = scope.sql("t.created_by");
    query_tasks(conn, &cond, values)
}

pub fn get_task(
    conn: &Connection,
    id: i64,
    scope: &RecordScope,
) -> rusqlite::Result<Option<PrefixListTask>> {
    let (cond, mut values) = scope.sql("t.created_by");
    values.insert(0, Value::Integer(id));
    Ok(query_tasks(conn, &format!("t.id = ? AND {cond}"), values)?
        .into_iter()
        .next())
}

fn set_task_targets(
    conn: &Connection,
    task_id: i64,
    isps: &[i64],
    groups: &[i64],
) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM task_isps WHERE task_id = ?1", [task_id])?;
    conn.execute("DELETE FROM task_isp_groups WHERE task_id = ?1", [task_id])?;
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO task_isps (task_id, isp_id) VALUES (?1, ?2)")?;
    for isp in isps {
        stmt.execute(params![task_id, isp])?;
    }
    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO task_isp_groups (task_id, isp_group_id) VALUES (?1, ?2)")?;
    for group in groups {
        stmt.execute(params![task_id, group])?;
    }
    Ok(())
}

pub fn insert_task(conn: &Connection, created_by: i64, form: &TaskForm) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO prefix_list_tasks (update_type, origin_as, as_path, ipv4_prefix_list,
                ipv6_prefix_list, subject_warning, related_ticket, loa_remark, remark, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            form.update_type.as_str(),
            form.origin_as,
            form.as_path,
            form.ipv4_prefix_list,
            form.ipv6_prefix_list,
            form.subject_warning,
            form.related_ticket,
            form.loa_remark,
            form.remark,
            created_by,
        ],
    )?;
    let id = conn.last_insert_rowid();
    set_task_targets(conn, id, &form.isps, &form.isp_groups)?;
    Ok(id)
}

pub fn update_task(conn: &Connection, id: i64, form: &TaskForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE prefix_list_tasks SET update_type = ?2, origin_as = ?3, as_path = ?4,
                ipv4_prefix_list = ?5, ipv6_prefix_list = ?6, subject_warning = ?7,
                related_ticket = ?8, loa_remark = ?9, remark = ?10
         WHERE id = ?1",
        params![
            id,
            form.update_type.as_str(),
            form.origin_as,
            form.as_path,
            form.ipv4_prefix_list,
            form.ipv6_prefix_list,
            form.subject_warning,
            form.related_ticket,
            form.loa_remark,
            form.remark,
        ],
    )?;
    set_task_targets(conn, id, &form.isps, &form.isp_groups)
}

/// Delete a task and the files only it used. Returns the stored paths to remove.
pub fn delete_task(conn: &Connection, id: i64) -> rusqlite::Result<Vec<String>> {
    let file_ids: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT DISTINCT file_id FROM task_file_isps WHERE task_id = ?1")?;
        let rows = stmt.query_map([id], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    conn.execute("DELETE FROM prefix_list_tasks WHERE id = ?1", [id])?;

    let mut removed = Vec::new();
    for file_id in file_ids {
        if let Some(path) = delete_file_if_orphaned(conn, file_id)? {
            removed.push(path);
        }
    }
    Ok(removed)
}

/// Copy a task's fields and targets to a new unsent task owned by `created_by`.
/// Attachments are not copied.
pub fn clone_task(conn: &Connection, id: i64, created_by: i64) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO prefix_list_tasks (update_type, origin_as, as_path, ipv4_prefix_list,
                ipv6_prefix_list, subject_warning, related_ticket, loa_remark, remark,
                mail_sent_time, created_by)
         SELECT update_type, origin_as, as_path, ipv4_prefix_list, ipv6_prefix_list,
                subject_warning, related_ticket, loa_remark, remark, '', ?2
         FROM prefix_list_tasks WHERE id = ?1",
        params![id, created_by],
    )?;
    let new_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO task_isps (task_id, isp_id) SELECT ?2, isp_id FROM task_isps WHERE task_id = ?1",
        params![id, new_id],
    )?;
    conn.execute(
        "INSERT INTO task_isp_groups (task_id, isp_group_id)
         SELECT ?2, isp_group_id FROM task_isp_groups WHERE task_id = ?1",
        params![id, new_id],
    )?;
    Ok(new_id)
}

pub fn set_mail_sent_time(conn: &Connection, id: i64, sent_at: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE prefix_list_tasks SET mail_sent_time = ?2 WHERE id = ?1",
        params![id, sent_at],
    )?;
    Ok(())
}

/// ISPs chosen directly plus members of the chosen groups, each once.
pub fn recipient_isps(conn: &Connection, task_id: i64) -> rusqlite::Result<Vec<Isp>> {
    query_isps(
        conn,
        "i.id IN (SELECT isp_id FROM task_isps WHERE task_id = ?
                  UNION
                  SELECT m.isp_id FROM task_isp_groups tg
                  JOIN isp_group_members m ON m.isp_group_id = tg.isp_group_id
                  WHERE tg.task_id = ?)",
        vec![Value::Integer(task_id), Value::Integer(task_id)],
    )
}

// ─── Attachments ─────────────────────────────────────────────

pub fn task_files(conn: &Connection, task_id: i64) -> rusqlite::Result<Vec<TaskFile>> {
    let mut stmt = conn.prepare(
        "SELECT l.kind, f.id, f.name, f.file_path, l.isp_id
         FROM task_file_isps l JOIN telecom_files f ON f.id = l.file_id
         WHERE l.task_id = ?1 ORDER BY l.isp_id, l.kind, f.id",
    )?;
    let rows = stmt.query_map([task_id], |row| {
        let kind: String = row.get(0)?;
        Ok(TaskFile {
            kind: FileKind::parse(&kind).ok_or_else(|| conversion_error(0, "file kind", &kind))?,
            file_id: row.get(1)?,
            name: row.get(2)?,
            file_path: row.get(3)?,
            isp_id: row.get(4)?,
        })
    })?;
    rows.collect()
}

/// Store a file record and link it to `isps` of the task as `kind`.
pub fn attach_file(
    conn: &Connection,
    task_id: i64,
    kind: FileKind,
    name: &str,
    file_path: &str,
    isps: &[i64],
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO telecom_files (name, file_path) VALUES (?1, ?2)",
        params![name, file_path],
    )?;
    let file_id = conn.last_insert_rowid();
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO task_file_isps (task_id, file_id, isp_id, kind)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for isp in isps {
        stmt.execute(params![task_id, file_id, isp, kind.as_str()])?;
    }
    Ok(file_id)
}

/// Remove one (kind, file, ISP) link. Returns whether a link existed and the
/// stored path when the file is no longer used.
pub fn detach_file(
    conn: &Connection,
    task_id: i64,
    kind: FileKind,
    file_id: i64,
    isp_id: i64,
) -> rusqlite::Result<(bool, Option<String>)> {
    let removed = conn.execute(
        "DELETE FROM task_file_isps WHERE task_id = ?1 AND kind = ?2 AND file_id = ?3 AND isp_id = ?4",
        params![task_id, kind.as_str(), file_id, isp_id],
    )?;
    if removed == 0 {
        return Ok((false, None));
    }
    Ok((true, delete_file_if_orphaned(conn, file_id)?))
}

fn delete_file_if_orphaned(conn: &Connection, file_id: i64) -> rusqlite::Result<Option<String>> {
    let in_use: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM task_file_isps WHERE file_id = ?1)",
        [file_id],
        |row| row.get(0),
    )?;
    if in_use {
        return Ok(None);
    }
    let path: Option<String> = conn
        .query_row(
            "SELECT file_path FROM telecom_files WHERE id = ?1",
            [file_id],
            |row| row.get(0),
        )
        .optional()?;
    conn.execute("DELETE FROM telecom_files WHERE id = ?1", [file_id])?;
    Ok(path)
}

// ─── Telecom archive ─────────────────────────────────────────

fn archive_from_row(row: &Row<'_>) -> rusqlite::Result<TelecomArchive> {
    Ok(TelecomArchive {
        id: row.get(0)?,
        name: row.get(1)?,
        file_path: row.get(2)?,
        date: row.get(3)?,
        created_by: summary_at(row, 4)?,
    })
}

fn archive_select() -> String {
    format!(
        "SELECT a.id, a.name, a.file_path, a.date, {SUMMARY_COLUMNS}
         FROM telecom_archives a JOIN users u ON u.id = a.created_by"
    )
}

pub fn list_archives(conn: &Connection) -> rusqlite::Result<Vec<TelecomArchive>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY a.date DESC, a.id DESC", archive_select()))?;
    let rows = stmt.query_map([], archive_from_row)?;
    rows.collect()
}

pub fn get_archive(conn: &Connection, id: i64) -> rusqlite::Result<Option<TelecomArchive>> {
    conn.query_row(
        &format!("{} WHERE a.id = ?1", archive_select()),
        [id],
        archive_from_row,
    )
    .optional()
}

pub fn insert_archive(
    conn: &Connection,
    created_by: i64,
    name: &str,
    file_path: &str,
    date: NaiveDate,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO telecom_archives (file_path, name, date, created_by) VALUES (?1, ?2, ?3, ?4)",
        params![file_path, name, date, created_by],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_archive(
    conn: &Connection,
    id: i64,
    name: &str,
    file_path: &str,
    date: NaiveDate,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE telecom_archives SET name = ?2, file_path = ?3, date = ?4 WHERE id = ?1",
        params![id, name, file_path, date],
    )?;
    Ok(())
}

pub fn delete_archive(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM telecom_archives WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_department, seed_user};
    use crate::db::{accounts, Db};

    fn isp_form(name: &str, to: &str, ip_version: IpVersion) -> IspForm {
        IspForm {
            name: name.to_string(),
            cname: format!("{name} 電信"),
            customer_no: String::new(),
            upstream_as: "3462".to_string(),
            primary_contact: "NOC".to_string(),
            to: to.to_string(),
            cc: String::new(),
            bcc: String::new(),
            ip_version,
            upstream_session_ip: "203.75.1.1/30".to_string(),
            chief_session_ip: "203.75.1.2/30".to_string(),
            telephone: String::new(),
            cellphone: String::new(),
            subject: String::new(),
            content: String::new(),
            remark: String::new(),
            eng_mail_type: false,
        }
    }

    fn task_form(isps: Vec<i64>, isp_groups: Vec<i64>) -> TaskForm {
        TaskForm {
            update_type: UpdateType::Add,
            isps,
            isp_groups,
            origin_as: "AS17408".to_string(),
            as_path: "17408".to_string(),
            ipv4_prefix_list: "203.69.0.0/16 le 24".to_string(),
            ipv6_prefix_list: String::new(),
            subject_warning: String::new(),
            related_ticket: String::new(),
            loa_remark: String::new(),
            remark: String::new(),
        }
    }

    #[tokio::test]
    async fn test_recipients_merge_groups_without_duplicates() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let noc = seed_user(conn, "noc");
            let hinet = insert_isp(conn, noc, &isp_form("HiNet", "unicom@cht.com.tw", IpVersion::V4))?;
            let tfn = insert_isp(conn, noc, &isp_form("TFN", "noc@tfn.net", IpVersion::Dual))?;
            let seednet = insert_isp(conn, noc, &isp_form("Seednet", "noc@seed.net", IpVersion::V6))?;
            let group = insert_group(
                conn,
                noc,
                &IspGroupForm {
                    name: "Taiwan".to_string(),
                    isps: vec![tfn, seednet],
                    remark: String::new(),
                },
            )?;

            let task = insert_task(conn, noc, &task_form(vec![hinet, tfn], vec![group]))?;
            let mut ids: Vec<i64> = recipient_isps(conn, task)?.iter().map(|i| i.id).collect();
            ids.sort();
            assert_eq!(ids, vec![hinet, tfn, seednet]);

            let map = group_isp_map(conn, &RecordScope::Owner(noc))?;
            assert_eq!(map.get(&group), Some(&vec![tfn, seednet]));
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_scope_counts_and_task_lookup() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let alice = seed_user(conn, "alice");
            let mallory = seed_user(conn, "mallory");
            let team = seed_department(conn, "I03");
            accounts::add_user_to_group(conn, alice, team)?;

            let ours = insert_isp(conn, alice, &isp_form("HiNet", "unicom@cht.com.tw", IpVersion::V4))?;
            let theirs = insert_isp(conn, mallory, &isp_form("Other", "noc@other.net", IpVersion::V4))?;

            let scope = RecordScope::MembersOf(vec![team]);
            assert_eq!(count_isps_in_scope(conn, &scope, &[ours, ours])?, 1);
            assert_eq!(count_isps_in_scope(conn, &scope, &[ours, theirs])?, 1);
            assert_eq!(list_isps(conn, &scope)?.len(), 1);

            let task = insert_task(conn, alice, &task_form(vec![ours], vec![]))?;
            let loaded = get_task(conn, task, &scope)?.unwrap();
            assert_eq!(loaded.isps[0].name, "HiNet");
            assert!(get_task(conn, task, &RecordScope::Owner(mallory))?.is_none());
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_files_follow_links() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let noc = seed_user(conn, "noc");
            let a = insert_isp(conn, noc, &isp_form("HiNet", "unicom@cht.com.tw", IpVersion::V4))?;
            let b = insert_isp(conn, noc, &isp_form("TFN", "noc@tfn.net", IpVersion::V4))?;
            let task = insert_task(conn, noc, &task_form(vec![a, b], vec![]))?;

            let loa = attach_file(conn, task, FileKind::Loa, "LOA.pdf", "telecom/1.pdf", &[a, b])?;
            attach_file(conn, task, FileKind::Roa, "ROA.pdf", "telecom/2.pdf", &[a])?;
            assert_eq!(task_files(conn, task)?.len(), 3);

            assert_eq!(detach_file(conn, task, FileKind::Loa, loa, a)?, (true, None));
            assert_eq!(
                detach_file(conn, task, FileKind::Loa, loa, b)?,
                (true, Some("telecom/1.pdf".to_string()))
            );
            assert_eq!(detach_file(conn, task, FileKind::Loa, loa, b)?, (false, None));

            let copy = clone_task(conn, task, noc)?;
            let copied = get_task(conn, copy, &RecordScope::Owner(noc))?.unwrap();
            assert_eq!(copied.isps.len(), 2);
            assert!(copied.files.is_empty());
            assert_eq!(copied.mail_sent_time, "");

            assert_eq!(delete_task(conn, task)?, vec!["telecom/2.pdf".to_string()]);
            Ok(())
        })
        .await
        .unwrap();
    }
}
