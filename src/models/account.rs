//! Users, groups and their profiles.

use chrono::NaiveDate;
use serde::Serialize;

/// Members of this group are supervisors.
pub const SUPERVISOR_GROUP_NAME: &str = "SUPERVISORS";

/// Login account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl User {
    /// "First Last", empty when neither is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Full name, falling back to the username.
    pub fn display_name(&self) -> String {
        let full = self.full_name();
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

/// Compact user reference embedded in other responses.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.display_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

/// Extra attributes attached to a group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupProfile {
    pub group_id: i64,
    pub managed_by: Option<i64>,
    pub is_displayed: bool,
    pub is_department: bool,
    pub parent_department: Option<i64>,
    /// Groups whose members' records this group may see.
    pub supervise_roles: Vec<Group>,
}

/// Per-user profile.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: i64,
    pub staff_code: String,
    pub job_title: String,
    pub phone_number: String,
    pub boss_id: Option<i64>,
    pub keep_diary: bool,
    pub diary_starting_date: NaiveDate,
    pub activated_role_id: Option<i64>,
}

/// A user playing named roles inside a group.
#[derive(Debug, Clone, Serialize)]
pub struct Play {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub roles: Vec<String>,
}

impl Play {
    pub fn describe(&self, username: &str, group_name: &str) -> String {
        if self.roles.is_empty() {
            format!("User {username} plays a member in group {group_name}")
        } else {
            format!(
                "User {username} plays {} in group {group_name}",
                self.roles.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: 1,
            username: "rico_hu".to_string(),
            email: String::new(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            is_active: true,
            is_superuser: false,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(user("", "").display_name(), "rico_hu");
        assert_eq!(user("Rico", "Hu").display_name(), "Rico Hu");
        assert_eq!(user("Rico", "").display_name(), "Rico");
    }

    #[test]
    fn test_play_describe() {
        let mut play = Play {
            id: 1,
            user_id: 1,
            group_id: 2,
            roles: vec![],
        };
        assert_eq!(
            play.describe("rico", "I01"),
            "User rico plays a member in group I01"
        );
        play.roles = vec!["lead".to_string(), "oncall".to_string()];
        assert_eq!(
            play.describe("rico", "I01"),
            "User rico plays lead, oncall in group I01"
        );
    }
}
