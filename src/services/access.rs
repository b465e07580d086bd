// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Row-level visibility rules.
//!
//! Every list and lookup of user-created records goes through a
//! [`RecordScope`], which limits rows by their `created_by` column.

use rusqlite::types::Value;

use crate::db::placeholders;

/// Which creators' records a user may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordScope {
    /// Only records created by this user.
    Owner(i64),
    /// Records created by any member of these groups.
    MembersOf(Vec<i64>),
}

impl RecordScope {
    /// Scope for shared department records (ISPs, tasks, reminders).
    ///
    /// A role that supervises other groups sees those groups' records,
    /// anyone else sees records of their own departments.
    pub fn department(department_ids: &[i64], supervise_role_ids: &[i64]) -> Self {
        if supervise_role_ids.is_empty() {
            Self::MembersOf(department_ids.to_vec())
        } else {
            Self::MembersOf(supervise_role_ids.to_vec())
        }
    }

    /// Scope for personal records (diaries and their log).
    pub fn personal(user_id: i64, supervise_role_ids: &[i64]) -> Self {
        if supervise_role_ids.is_empty() {
            Self::Owner(user_id)
        } else {
            Self::MembersOf(supervise_role_ids.to_vec())
        }
    }

    /// SQL condition on `column` plus its parameters.
    pub fn sql(&self, column: &str) -> (String, Vec<Value>) {
        match self {
            Self::Owner(user_id) => (format!("{column} = ?"), vec![Value::Integer(*user_id)]),
            Self::MembersOf(group_ids) if group_ids.is_empty() => ("0".to_string(), Vec::new()),
            Self::MembersOf(group_ids) => (
                format!(
                    "{column} IN (SELECT user_id FROM user_groups WHERE group_id IN ({}))",
                    placeholders(group_ids.len())
                ),
                group_ids.iter().map(|id| Value::Integer(*id)).collect(),
            ),
        }
    }
}
