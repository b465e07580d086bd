//! Uploaded documents shared across the company.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::UserSummary;

/// Archives with this marker in their name hold the monthly meeting calendar.
pub const MEETING_CALENDAR_MARKER: &str = "網應處月會行事曆";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    /// General files
    Files,
    /// Monthly journals
    Journals,
    /// Department announcements
    Announce,
}

impl ArchiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Journals => "journals",
            Self::Announce => "announce",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "files" => Some(Self::Files),
            "journals" => Some(Self::Journals),
            "announce" => Some(Self::Announce),
            _ => None,
        }
    }

    /// Page size of the list; journals and announcements always show everything.
    pub fn paginate_by(self) -> usize {
        match self {
            Self::Files => 5,
            Self::Journals | Self::Announce => 12,
        }
    }

    pub fn always_show_all(self) -> bool {
        !matches!(self, Self::Files)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Archive {
    pub id: i64,
    pub name: String,
    /// Path relative to the media root
    pub file_path: String,
    #[serde(rename = "type")]
    pub archive_type: ArchiveType,
    pub created_by: UserSummary,
    pub created_at: DateTime<Utc>,
}

impl Archive {
    /// Download name: the display name plus the stored file's extension.
    pub fn full_filename(&self) -> String {
        full_filename(&self.name, &self.file_path)
    }

    pub fn is_excel_file(&self) -> bool {
        let lower = self.file_path.to_lowercase();
        lower.ends_with(".xlsx") || lower.ends_with(".xls")
    }

    pub fn can_convert_to_reminders(&self) -> bool {
        self.is_excel_file() && self.name.contains(MEETING_CALENDAR_MARKER)
    }
}

/// `name` plus the extension of `stored_path` (with its dot).
pub fn full_filename(name: &str, stored_path: &str) -> String {
    match Path::new(stored_path).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveRenameForm {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(name: &str, path: &str) -> Archive {
        Archive {
            id: 1,
            name: name.to_string(),
            file_path: path.to_string(),
            archive_type: ArchiveType::Announce,
            created_by: UserSummary {
                id: 1,
                username: "vicky".to_string(),
                name: "vicky".to_string(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_filename_appends_extension() {
        assert_eq!(
            archive("Q3 report", "archive/5b1c.pdf").full_filename(),
            "Q3 report.pdf"
        );
        assert_eq!(archive("notes", "archive/5b1c").full_filename(), "notes");
    }

    #[test]
    fn test_can_convert_requires_excel_and_marker() {
        assert!(archive("2024 網應處月會行事曆", "archive/a.XLSX").can_convert_to_reminders());
        assert!(!archive("2024 網應處月會行事曆", "archive/a.pdf").can_convert_to_reminders());
        assert!(!archive("2024 calendar", "archive/a.xlsx").can_convert_to_reminders());
    }

    #[test]
    fn test_paging_per_type() {
        assert_eq!(ArchiveType::Files.paginate_by(), 5);
        assert!(ArchiveType::Journals.always_show_all());
        assert_eq!(ArchiveType::parse("announce"), Some(ArchiveType::Announce));
        assert_eq!(ArchiveType::parse("misc"), None);
    }
}
