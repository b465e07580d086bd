//! Glossary terms and tool bookmarks.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct Term {
    pub id: i64,
    pub short_name: String,
    pub full_name: String,
    pub url: Option<String>,
    pub management_department: String,
    pub description: String,
    pub has_external_link: bool,
    pub created_by: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TermForm {
    #[validate(length(min = 1, max = 100))]
    pub short_name: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[serde(default)]
    #[validate(url(message = "Enter a valid URL."), length(max = 255))]
    pub url: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub management_department: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub description: String,
}

impl TermForm {
    /// Blank URLs are stored as absent.
    pub fn normalize(mut self) -> Self {
        self.url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub created_by: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToolForm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(url(message = "Enter a valid URL."), length(max = 255))]
    pub url: String,
}
