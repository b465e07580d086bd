// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Users, groups, profiles and permissions.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::account::{Group, GroupProfile, Play, Profile, User, UserSummary};

const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.first_name, u.last_name, u.is_active, u.is_superuser";

/// Columns read by [`summary_at`], for queries joining `users u`.
pub const SUMMARY_COLUMNS: &str = "u.id, u.username, u.first_name, u.last_name";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_active: row.get(5)?,
        is_superuser: row.get(6)?,
    })
}

/// Read a [`UserSummary`] from the four [`SUMMARY_COLUMNS`] starting at `idx`.
pub fn summary_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<UserSummary> {
    let id: i64 = row.get(idx)?;
    let username: String = row.get(idx + 1)?;
    let first: String = row.get(idx + 2)?;
    let last: String = row.get(idx + 3)?;
    let full = format!("{first} {last}").trim().to_string();
    Ok(UserSummary {
        id,
        name: if full.is_empty() { username.clone() } else { full },
        username,
    })
}

/// Like [`summary_at`] for a nullable `LEFT JOIN users u`.
pub fn optional_summary_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<UserSummary>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(_) => summary_at(row, idx).map(Some),
        None => Ok(None),
    }
}

// ─── Users ───────────────────────────────────────────────────

pub fn get_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
        [id],
        user_from_row,
    )
    .optional()
}

/// Look up a login by username or (case-insensitive) e-mail.
/// Returns the user and stored password hash.
pub fn find_login(conn: &Connection, login: &str) -> rusqlite::Result<Option<(User, String)>> {
    conn.query_row(
        &format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM users u
             WHERE u.username = ?1 OR (u.email <> '' AND lower(u.email) = lower(?1))
             ORDER BY u.username = ?1 DESC, u.id
             LIMIT 1"
        ),
        [login],
        |row| Ok((user_from_row(row)?, row.get(7)?)),
    )
    .optional()
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"),
        [username],
        user_from_row,
    )
    .optional()
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub boss_id: Option<i64>,
    pub keep_diary: bool,
    pub diary_starting_date: NaiveDate,
}

/// Insert a user together with their profile.
pub fn create_user(conn: &Connection, user: &NewUser) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, first_name, last_name, password_hash, is_superuser, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.username,
            user.email,
            user.first_name,
            user.last_name,
            user.password_hash,
            user.is_superuser,
            Utc::now(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO profiles (user_id, boss_id, keep_diary, diary_starting_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, user.boss_id, user.keep_diary, user.diary_starting_date],
    )?;
    Ok(id)
}

pub fn set_user_active(conn: &Connection, user_id: i64, active: bool) -> rusqlite::Result<bool> {
    Ok(conn.execute(
        "UPDATE users SET is_active = ?2 WHERE id = ?1",
        params![user_id, active],
    )? > 0)
}

// ─── Profiles ────────────────────────────────────────────────

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(0)?,
        staff_code: row.get(1)?,
        job_title: row.get(2)?,
        phone_number: row.get(3)?,
        boss_id: row.get(4)?,
        keep_diary: row.get(5)?,
        diary_starting_date: row.get(6)?,
        activated_role_id: row.get(7)?,
    })
}

const PROFILE_COLUMNS: &str = "user_id, staff_code, job_title, phone_number, boss_id, keep_diary, diary_starting_date, activated_role_id";

pub fn get_profile(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
        [user_id],
        profile_from_row,
    )
    .optional()
}

/// Profiles of active users who keep a diary.
pub fn diary_keepers(conn: &Connection) -> rusqlite::Result<Vec<(User, Profile)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS}, p.user_id, p.staff_code, p.job_title, p.phone_number, p.boss_id,
                p.keep_diary, p.diary_starting_date, p.activated_role_id
         FROM users u JOIN profiles p ON p.user_id = u.id
         WHERE p.keep_diary = 1 AND u.is_active = 1
         ORDER BY u.id"
    ))?;
    let rows = stmt.query_map([], |row| {
        let user = user_from_row(row)?;
        let profile = Profile {
            user_id: row.get(7)?,
            staff_code: row.get(8)?,
            job_title: row.get(9)?,
            phone_number: row.get(10)?,
            boss_id: row.get(11)?,
            keep_diary: row.get(12)?,
            diary_starting_date: row.get(13)?,
            activated_role_id: row.get(14)?,
        };
        Ok((user, profile))
    })?;
    rows.collect()
}

/// Every user's boss id and e-mail address, keyed by user id.
pub fn boss_links(conn: &Connection) -> rusqlite::Result<HashMap<i64, (Option<i64>, String)>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, p.boss_id, u.email FROM users u LEFT JOIN profiles p ON p.user_id = u.id",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, (row.get(1)?, row.get(2)?))))?;
    rows.collect()
}

pub fn set_activated_role(
    conn: &Connection,
    user_id: i64,
    group_id: Option<i64>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE profiles SET activated_role_id = ?2 WHERE user_id = ?1",
        params![user_id, group_id],
    )?;
    Ok(())
}

// ─── Groups ──────────────────────────────────────────────────

pub fn get_group(conn: &Connection, id: i64) -> rusqlite::Result<Option<Group>> {
    conn.query_row("SELECT id, name FROM groups WHERE id = ?1", [id], |row| {
        Ok(Group {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .optional()
}

pub fn find_group_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row("SELECT id, name FROM groups WHERE name = ?1", [name], |row| {
        Ok(Group {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .optional()
}

#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub name: String,
    pub is_department: bool,
    pub is_displayed: bool,
    pub parent_department: Option<i64>,
    pub managed_by: Option<i64>,
}

pub fn create_group(conn: &Connection, group: &NewGroup) -> rusqlite::Result<i64> {
    conn.execute("INSERT INTO groups (name) VALUES (?1)", [&group.name])?;
    let id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO group_profiles (group_id, managed_by, is_displayed, is_department, parent_department)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            group.managed_by,
            group.is_displayed,
            group.is_department,
            group.parent_department
        ],
    )?;
    Ok(id)
}

/// The group's profile; groups without one get default flags.
pub fn get_group_profile(conn: &Connection, group_id: i64) -> rusqlite::Result<GroupProfile> {
    let profile = conn
        .query_row(
            "SELECT managed_by, is_displayed, is_department, parent_department
             FROM group_profiles WHERE group_id = ?1",
            [group_id],
            |row| {
                Ok(GroupProfile {
                    group_id,
                    managed_by: row.get(0)?,
                    is_displayed: row.get(1)?,
                    is_department: row.get(2)?,
                    parent_department: row.get(3)?,
                    supervise_roles: Vec::new(),
                })
            },
        )
        .optional()?
        .unwrap_or(GroupProfile {
            group_id,
            ..Default::default()
        });

    let mut stmt = conn.prepare(
        "SELECT g.id, g.name FROM group_supervise_roles s
         JOIN groups g ON g.id = s.supervised_group_id
         WHERE s.group_id = ?1 ORDER BY g.id",
    )?;
    let supervise_roles = stmt
        .query_map([group_id], |row| {
            Ok(Group {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(GroupProfile {
        supervise_roles,
        ..profile
    })
}

pub fn add_supervise_role(
    conn: &Connection,
    group_id: i64,
    supervised_group_id: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO group_supervise_roles (group_id, supervised_group_id) VALUES (?1, ?2)",
        params![group_id, supervised_group_id],
    )?;
    Ok(())
}

/// A group the user belongs to, with its display flags.
#[derive(Debug, Clone)]
pub struct Membership {
    pub group: Group,
    pub is_displayed: bool,
    pub is_department: bool,
}

pub fn user_memberships(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Membership>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.name, COALESCE(p.is_displayed, 0), COALESCE(p.is_department, 0)
         FROM user_groups ug
         JOIN groups g ON g.id = ug.group_id
         LEFT JOIN group_profiles p ON p.group_id = g.id
         WHERE ug.user_id = ?1
         ORDER BY g.id",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok(Membership {
            group: Group {
                id: row.get(0)?,
                name: row.get(1)?,
            },
            is_displayed: row.get(2)?,
            is_department: row.get(3)?,
        })
    })?;
    rows.collect()
}

pub fn add_user_to_group(conn: &Connection, user_id: i64, group_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?1, ?2)",
        params![user_id, group_id],
    )?;
    Ok(())
}

pub fn is_member(conn: &Connection, user_id: i64, group_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_groups WHERE user_id = ?1 AND group_id = ?2)",
        params![user_id, group_id],
        |row| row.get(0),
    )
}

/// Members of a group, optionally only active ones.
pub fn group_members(
    conn: &Connection,
    group_id: i64,
    active_only: bool,
) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         JOIN user_groups ug ON ug.user_id = u.id
         WHERE ug.group_id = ?1 AND (?2 = 0 OR u.is_active = 1)
         ORDER BY u.username"
    ))?;
    let rows = stmt.query_map(params![group_id, active_only], user_from_row)?;
    rows.collect()
}

// ─── Roles and plays ─────────────────────────────────────────

fn role_id(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT OR IGNORE INTO roles (name) VALUES (?1)", [name])?;
    conn.query_row("SELECT id FROM roles WHERE name = ?1", [name], |row| row.get(0))
}

/// Record that a user plays `roles` in a group. Roles are created on demand.
pub fn create_play(
    conn: &Connection,
    user_id: i64,
    group_id: i64,
    roles: &[String],
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO plays (user_id, group_id) VALUES (?1, ?2)",
        params![user_id, group_id],
    )?;
    let play_id = conn.last_insert_rowid();
    for role in roles {
        let role_id = role_id(conn, role)?;
        conn.execute(
            "INSERT OR IGNORE INTO play_roles (play_id, role_id) VALUES (?1, ?2)",
            params![play_id, role_id],
        )?;
    }
    Ok(play_id)
}

/// Plays of a user, with the group name of each.
pub fn user_plays(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<(Play, String)>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.group_id, g.name FROM plays p
         JOIN groups g ON g.id = p.group_id
         WHERE p.user_id = ?1 ORDER BY p.id",
    )?;
    let plays = stmt
        .query_map([user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut roles_stmt = conn.prepare(
        "SELECT r.name FROM play_roles pr JOIN roles r ON r.id = pr.role_id
         WHERE pr.play_id = ?1 ORDER BY r.name",
    )?;
    plays
        .into_iter()
        .map(|(id, group_id, group_name)| {
            let roles = roles_stmt
                .query_map([id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok((
                Play {
                    id,
                    user_id,
                    group_id,
                    roles,
                },
                group_name,
            ))
        })
        .collect()
}

// ─── Permissions ─────────────────────────────────────────────

/// Codenames granted directly or through any of the user's groups.
pub fn user_permissions(conn: &Connection, user_id: i64) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT codename FROM user_permissions WHERE user_id = ?1
         UNION
         SELECT gp.codename FROM group_permissions gp
         JOIN user_groups ug ON ug.group_id = gp.group_id
         WHERE ug.user_id = ?1",
    )?;
    let rows = stmt.query_map([user_id], |row| row.get(0))?;
    rows.collect()
}

pub fn grant_user_permission(conn: &Connection, user_id: i64, codename: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_permissions (user_id, codename) VALUES (?1, ?2)",
        params![user_id, codename],
    )?;
    Ok(())
}

pub fn grant_group_permission(
    conn: &Connection,
    group_id: i64,
    codename: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO group_permissions (group_id, codename) VALUES (?1, ?2)",
        params![group_id, codename],
    )?;
    Ok(())
}
