//! News posts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    /// Publication date
    pub at: NaiveDate,
    /// Last day the post stays pinned
    pub due: Option<NaiveDate>,
    pub created_by: Option<UserSummary>,
}

impl News {
    /// Whether the post belongs on the diary page on `today`.
    pub fn is_pinned_on(&self, today: NaiveDate) -> bool {
        self.is_pinned && self.at <= today && self.due.is_none_or(|due| due >= today)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewsForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
    pub at: NaiveDate,
    #[serde(default)]
    pub due: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news(at: &str, due: Option<&str>) -> News {
        News {
            id: 1,
            title: "Maintenance".to_string(),
            content: String::new(),
            is_pinned: true,
            at: at.parse().unwrap(),
            due: due.map(|d| d.parse().unwrap()),
            created_by: None,
        }
    }

    #[test]
    fn test_is_pinned_on_respects_window() {
        let today: NaiveDate = "2024-05-10".parse().unwrap();
        assert!(news("2024-05-01", None).is_pinned_on(today));
        assert!(news("2024-05-10", Some("2024-05-10")).is_pinned_on(today));
        assert!(!news("2024-05-11", None).is_pinned_on(today));
        assert!(!news("2024-05-01", Some("2024-05-09")).is_pinned_on(today));

        let mut unpinned = news("2024-05-01", None);
        unpinned.is_pinned = false;
        assert!(!unpinned.is_pinned_on(today));
    }
}
