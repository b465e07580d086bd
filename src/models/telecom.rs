//! ISP contacts and prefix-list update tasks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpVersion {
    #[serde(rename = "ipv4")]
    V4,
    #[serde(rename = "ipv6")]
    V6,
    #[serde(rename = "ipv4&ipv6")]
    Dual,
}

impl IpVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V4 => "ipv4",
            Self::V6 => "ipv6",
            Self::Dual => "ipv4&ipv6",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ipv4" => Some(Self::V4),
            "ipv6" => Some(Self::V6),
            "ipv4&ipv6" => Some(Self::Dual),
            _ => None,
        }
    }
}

/// ISP contact record.
#[derive(Debug, Clone, Serialize)]
pub struct Isp {
    pub id: i64,
    pub name: String,
    /// Chinese name
    pub cname: String,
    pub customer_no: String,
    pub upstream_as: String,
    pub primary_contact: String,
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub ip_version: IpVersion,
    pub upstream_session_ip: String,
    pub chief_session_ip: String,
    pub telephone: String,
    pub cellphone: String,
    /// Custom letter subject, default template when blank
    pub subject: String,
    /// Custom letter description, default template when blank
    pub content: String,
    pub remark: String,
    /// Send the English letter
    pub eng_mail_type: bool,
    pub created_by: UserSummary,
}

impl Isp {
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.cname)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IspForm {
    #[validate(length(min = 1, max = 63))]
    pub name: String,
    #[validate(length(min = 1, max = 63))]
    pub cname: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub customer_no: String,
    #[validate(length(min = 1, max = 63))]
    pub upstream_as: String,
    #[validate(length(min = 1, max = 63))]
    pub primary_contact: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub to: String,
    #[serde(default)]
    #[validate(custom(function = "crate::validators::email_list_field"))]
    pub cc: String,
    #[serde(default)]
    #[validate(custom(function = "crate::validators::email_list_field"))]
    pub bcc: String,
    pub ip_version: IpVersion,
    #[validate(
        length(min = 1, message = "This field is required."),
        custom(function = "crate::validators::prefix_list_field")
    )]
    pub upstream_session_ip: String,
    #[validate(
        length(min = 1, message = "This field is required."),
        custom(function = "crate::validators::prefix_list_field")
    )]
    pub chief_session_ip: String,
    #[serde(default)]
    #[validate(length(max = 63))]
    pub telephone: String,
    #[serde(default)]
    #[validate(length(max = 63))]
    pub cellphone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub eng_mail_type: bool,
}

/// Short reference to an ISP.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IspRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IspGroup {
    pub id: i64,
    pub name: String,
    pub remark: String,
    pub isps: Vec<IspRef>,
    pub created_by: UserSummary,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IspGroupForm {
    #[validate(length(min = 1, max = 63))]
    pub name: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub isps: Vec<i64>,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateType {
    #[serde(rename = "add prefix-list")]
    Add,
    #[serde(rename = "delete prefix-list")]
    Delete,
}

impl UpdateType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add prefix-list",
            Self::Delete => "delete prefix-list",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add prefix-list" => Some(Self::Add),
            "delete prefix-list" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Role of a file attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Roa,
    Loa,
    ExtraFile,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [Self::Roa, Self::Loa, Self::ExtraFile];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Roa => "roa",
            Self::Loa => "loa",
            Self::ExtraFile => "extra_file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }
}

/// A stored file linked to one ISP of a task.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskFile {
    pub kind: FileKind,
    pub file_id: i64,
    pub name: String,
    #[serde(skip)]
    pub file_path: String,
    pub isp_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrefixListTask {
    pub id: i64,
    pub update_type: UpdateType,
    pub isps: Vec<IspRef>,
    pub isp_groups: Vec<IspRef>,
    pub origin_as: String,
    pub as_path: String,
    pub ipv4_prefix_list: String,
    pub ipv6_prefix_list: String,
    pub subject_warning: String,
    pub related_ticket: String,
    pub loa_remark: String,
    pub remark: String,
    /// `YYYY-MM-DD HH:MM:SS` of the last send, empty when never sent
    pub mail_sent_time: String,
    pub files: Vec<TaskFile>,
    pub created_by: UserSummary,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskForm {
    pub update_type: UpdateType,
    #[serde(default)]
    pub isps: Vec<i64>,
    #[serde(default)]
    pub isp_groups: Vec<i64>,
    #[validate(length(min = 1, max = 63))]
    pub origin_as: String,
    #[validate(length(min = 1, max = 63))]
    pub as_path: String,
    #[serde(default)]
    #[validate(custom(function = "crate::validators::prefix_list_field"))]
    pub ipv4_prefix_list: String,
    #[serde(default)]
    #[validate(custom(function = "crate::validators::prefix_list_field"))]
    pub ipv6_prefix_list: String,
    #[serde(default)]
    #[validate(length(max = 63))]
    pub subject_warning: String,
    #[serde(default)]
    #[validate(length(max = 63))]
    pub related_ticket: String,
    #[serde(default)]
    pub loa_remark: String,
    #[serde(default)]
    pub remark: String,
}

/// Dated file kept by the telecom team.
#[derive(Debug, Clone, Serialize)]
pub struct TelecomArchive {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub file_path: String,
    pub date: NaiveDate,
    pub created_by: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_strings() {
        assert_eq!(IpVersion::parse("ipv4&ipv6"), Some(IpVersion::Dual));
        assert_eq!(IpVersion::Dual.as_str(), "ipv4&ipv6");
        assert_eq!(FileKind::parse("extra_file"), Some(FileKind::ExtraFile));
        assert_eq!(FileKind::parse("contract"), None);
        assert_eq!(
            UpdateType::parse("delete prefix-list"),
            Some(UpdateType::Delete)
        );
    }

    #[test]
    fn test_task_form_rejects_bad_prefix_list() {
        let form: TaskForm = serde_json::from_value(serde_json::json!({
            "update_type": "add prefix-list",
            "origin_as": "AS17408",
            "as_path": "17408",
            "ipv4_prefix_list": "100.100.100.100/24 le 16",
        }))
        .unwrap();
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("ipv4_prefix_list"));
    }

    #[test]
    fn test_isp_form_requires_session_ips() {
        let form: IspForm = serde_json::from_value(serde_json::json!({
            "name": "HiNet",
            "cname": "中華電信",
            "upstream_as": "3462",
            "primary_contact": "NOC",
            "to": "unicom@cht.com.tw",
            "cc": "a@cht.com.tw;b@cht.com.tw;",
            "ip_version": "ipv4",
            "upstream_session_ip": "",
            "chief_session_ip": "203.75.1.1/30",
        }))
        .unwrap();
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("upstream_session_ip"));
        assert!(!fields.contains_key("cc"));
    }
}
