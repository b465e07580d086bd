// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prefix-list update letters to ISPs.
//!
//! A task is mailed to every ISP it names directly or through a group.
//! Each ISP gets one letter in the HiNet, English or Chinese layout with
//! the files attached for that ISP. ISPs whose IP version has no matching
//! prefix list are skipped.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::AppError;
use crate::models::telecom::{FileKind, IpVersion, Isp, PrefixListTask, TaskFile, UpdateType};
use crate::services::mailer::{MailAttachment, Mailer, OutgoingMail};
use crate::services::storage::FileStorage;
use crate::validators::split_separated;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid blank line regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterLayout {
    Hinet,
    English,
    Chinese,
}

/// `ipv4`, `ipv6` or `ipv4 & ipv6`, from the lists the task carries.
pub fn ip_type(task: &PrefixListTask) -> &'static str {
    match (
        task.ipv4_prefix_list.trim().is_empty(),
        task.ipv6_prefix_list.trim().is_empty(),
    ) {
        (false, false) => "ipv4 & ipv6",
        (false, true) => "ipv4",
        _ => "ipv6",
    }
}

pub fn prefix_lines(list: &str) -> Vec<String> {
    split_separated(list, ',')
}

/// Put the HiNet contact first, keeping the rest in order.
pub fn order_recipients(mut isps: Vec<Isp>, hinet_mail: &str) -> Vec<Isp> {
    isps.sort_by_key(|isp| isp.to != hinet_mail);
    isps
}

/// Why `isp` cannot receive this task, if it cannot.
pub fn skip_reason(isp: &Isp, task: &PrefixListTask) -> Option<String> {
    let has_v4 = !task.ipv4_prefix_list.trim().is_empty();
    let has_v6 = !task.ipv6_prefix_list.trim().is_empty();
    let reason = match isp.ip_version {
        IpVersion::V4 if !has_v4 => "缺少 IPv4 prefix",
        IpVersion::V6 if !has_v6 => "缺少 IPv6 prefix",
        IpVersion::Dual if !has_v4 && !has_v6 => "需要同時有 IPv4 與 IPv6 prefix",
        _ => return None,
    };
    Some(format!("{}({}) - {}", isp.name, isp.to, reason))
}

pub fn layout(isp: &Isp, hinet_mail: &str) -> LetterLayout {
    if isp.to == hinet_mail {
        LetterLayout::Hinet
    } else if isp.eng_mail_type {
        LetterLayout::English
    } else {
        LetterLayout::Chinese
    }
}

/// Letter subject. A custom subject on the ISP wins.
pub fn subject(isp: &Isp, task: &PrefixListTask) -> String {
    if !isp.subject.trim().is_empty() {
        return isp.subject.trim().to_string();
    }
    let brand = if isp.eng_mail_type {
        "[CHIEF TELECOM]"
    } else {
        "[是方電訊]"
    };
    format!(
        "{brand} -- Please add new BGP entry for our customer - {} {}",
        task.origin_as, task.subject_warning
    )
    .trim_end()
    .to_string()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn paragraphs(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>\n", escape(line)))
        .collect()
}

fn prefix_block(label: &str, list: &str) -> String {
    let lines = prefix_lines(list);
    if lines.is_empty() {
        return String::new();
    }
    let items: String = lines
        .iter()
        .map(|line| format!("<li>{}</li>\n", escape(line)))
        .collect();
    format!("<p>{label}</p>\n<ul>\n{items}</ul>\n")
}

fn detail_rows(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| {
            format!(
                "<tr><th align=\"left\">{}</th><td>{}</td></tr>\n",
                label,
                escape(value)
            )
        })
        .collect();
    format!("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\n{body}</table>\n")
}

/// The HTML letter for one ISP.
pub fn render_letter(isp: &Isp, task: &PrefixListTask, layout: LetterLayout) -> String {
    let ip_type = ip_type(task);
    let mut html = String::new();

    match layout {
        LetterLayout::English => {
            html.push_str(&format!("<p>Dear {} team,</p>\n", escape(&isp.name)));
            if isp.content.trim().is_empty() {
                let action = match task.update_type {
                    UpdateType::Add => "add the following prefixes to",
                    UpdateType::Delete => "remove the following prefixes from",
                };
                html.push_str(&format!(
                    "<p>Please {action} the prefix-list of our BGP session for our customer {}.</p>\n",
                    escape(&task.origin_as)
                ));
            } else {
                html.push_str(&paragraphs(&isp.content));
            }
            html.push_str(&detail_rows(&[
                ("Customer No.", &isp.customer_no),
                ("Upstream AS", &isp.upstream_as),
                ("Origin AS", &task.origin_as),
                ("AS Path", &task.as_path),
                ("IP Type", ip_type),
                ("Upstream Session IP", &isp.upstream_session_ip),
                ("Chief Session IP", &isp.chief_session_ip),
                ("Related Ticket", &task.related_ticket),
            ]));
            html.push_str(&prefix_block("IPv4 prefix-list:", &task.ipv4_prefix_list));
            html.push_str(&prefix_block("IPv6 prefix-list:", &task.ipv6_prefix_list));
            html.push_str("<p>Thank you for your help.</p>\n<p>Best regards,<br>Chief Telecom T21 NOC</p>\n");
        }
        LetterLayout::Chinese | LetterLayout::Hinet => {
            html.push_str(&format!("<p>{} 您好：</p>\n", escape(&isp.cname)));
            if isp.content.trim().is_empty() {
                let action = match task.update_type {
                    UpdateType::Add => "新增",
                    UpdateType::Delete => "刪除",
                };
                html.push_str(&format!(
                    "<p>本公司客戶 {} 需{action}以下 BGP prefix-list，煩請協助設定，謝謝。</p>\n",
                    escape(&task.origin_as)
                ));
            } else {
                html.push_str(&paragraphs(&isp.content));
            }
            html.push_str(&detail_rows(&[
                ("客戶編號", &isp.customer_no),
                ("Upstream AS", &isp.upstream_as),
                ("Origin AS", &task.origin_as),
                ("AS Path", &task.as_path),
                ("IP 類型", ip_type),
                ("Upstream Session IP", &isp.upstream_session_ip),
                ("Chief Session IP", &isp.chief_session_ip),
                ("相關工單", &task.related_ticket),
            ]));
            html.push_str(&prefix_block("IPv4 prefix-list：", &task.ipv4_prefix_list));
            html.push_str(&prefix_block("IPv6 prefix-list：", &task.ipv6_prefix_list));
            if layout == LetterLayout::Hinet && !task.loa_remark.trim().is_empty() {
                html.push_str("<p>LOA 備註：</p>\n");
                html.push_str(&paragraphs(&task.loa_remark));
            }
            html.push_str("<p>是方電訊 T21 網路維運中心 敬上</p>\n");
        }
    }
    html
}

/// Plain text alternative of an HTML letter.
pub fn strip_tags(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    BLANK_LINES.replace_all(text.trim(), "\n\n").into_owned()
}

/// Files attached to `isp`'s letter: ROA, then LOA, then extra files.
pub fn files_for<'a>(task: &'a PrefixListTask, isp_id: i64) -> Vec<&'a TaskFile> {
    let mut files: Vec<&TaskFile> = task.files.iter().filter(|f| f.isp_id == isp_id).collect();
    files.sort_by_key(|f| FileKind::ALL.iter().position(|k| *k == f.kind));
    files
}

/// What one ISP would receive.
#[derive(Debug, Clone, Serialize)]
pub struct LetterPreview {
    pub isp_id: i64,
    pub isp: String,
    pub to: String,
    pub layout: LetterLayout,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<TaskFile>,
    /// Set when the ISP would be skipped
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskPreview {
    pub ip_type: &'static str,
    pub ipv4_contents: Vec<String>,
    pub ipv6_contents: Vec<String>,
    pub roa: Vec<TaskFile>,
    pub loa: Vec<TaskFile>,
    pub extra_file: Vec<TaskFile>,
    pub letters: Vec<LetterPreview>,
}

/// Everything the send would do, without sending.
pub fn preview(task: &PrefixListTask, isps: Vec<Isp>, hinet_mail: &str) -> TaskPreview {
    let by_kind = |kind: FileKind| -> Vec<TaskFile> {
        task.files.iter().filter(|f| f.kind == kind).cloned().collect()
    };
    let letters = order_recipients(isps, hinet_mail)
        .into_iter()
        .map(|isp| {
            let layout = layout(&isp, hinet_mail);
            LetterPreview {
                isp_id: isp.id,
                isp: isp.label(),
                to: isp.to.clone(),
                layout,
                subject: subject(&isp, task),
                html: render_letter(&isp, task, layout),
                attachments: files_for(task, isp.id).into_iter().cloned().collect(),
                skipped: skip_reason(&isp, task),
            }
        })
        .collect();

    TaskPreview {
        ip_type: ip_type(task),
        ipv4_contents: prefix_lines(&task.ipv4_prefix_list),
        ipv6_contents: prefix_lines(&task.ipv6_prefix_list),
        roa: by_kind(FileKind::Roa),
        loa: by_kind(FileKind::Loa),
        extra_file: by_kind(FileKind::ExtraFile),
        letters,
    }
}

/// Result of mailing a task.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendReport {
    pub sent: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

async fn load_attachments(
    storage: &FileStorage,
    task: &PrefixListTask,
    isp_id: i64,
) -> Result<Vec<MailAttachment>, AppError> {
    let mut attachments = Vec::new();
    for file in files_for(task, isp_id) {
        attachments.push(MailAttachment {
            filename: file.name.clone(),
            content: storage.read(&file.file_path).await?,
        });
    }
    Ok(attachments)
}

/// Mail the task to each recipient ISP. Per-ISP failures are collected.
pub async fn send_letters(
    mailer: &dyn Mailer,
    storage: &FileStorage,
    from: &str,
    hinet_mail: &str,
    task: &PrefixListTask,
    isps: Vec<Isp>,
) -> SendReport {
    let mut report = SendReport::default();

    for isp in order_recipients(isps, hinet_mail) {
        let label = format!("{}({})", isp.name, isp.to);
        if let Some(reason) = skip_reason(&isp, task) {
            tracing::info!(task_id = task.id, isp_id = isp.id, reason = %reason, "Skipping ISP");
            report.skipped.push(reason);
            continue;
        }

        let attachments = match load_attachments(storage, task, isp.id).await {
            Ok(attachments) => attachments,
            Err(e) => {
                tracing::error!(task_id = task.id, isp_id = isp.id, error = %e, "Task attachment unreadable");
                report.failed.push(format!("{label} - {e}"));
                continue;
            }
        };

        let html = render_letter(&isp, task, layout(&isp, hinet_mail));
        let mail = OutgoingMail {
            from: from.to_string(),
            to: split_separated(&isp.to, ';'),
            cc: split_separated(&isp.cc, ';'),
            bcc: split_separated(&isp.bcc, ';'),
            subject: subject(&isp, task),
            text: strip_tags(&html),
            html: Some(html),
            attachments,
        };

        match mailer.send(&mail).await {
            Ok(()) => {
                tracing::info!(task_id = task.id, isp_id = isp.id, to = %isp.to, "Task mail sent");
                report.sent.push(label);
            }
            Err(e) => {
                tracing::error!(task_id = task.id, isp_id = isp.id, error = %e, "Task mail failed");
                report.failed.push(format!("{label} - {e}"));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::UserSummary;
    use crate::services::mailer::MemoryMailer;

    const HINET: &str = "unicom@cht.com.tw";

    fn owner() -> UserSummary {
        UserSummary {
            id: 1,
            username: "noc".to_string(),
            name: "noc".to_string(),
        }
    }

    fn isp(id: i64, name: &str, to: &str, ip_version: IpVersion) -> Isp {
        Isp {
            id,
            name: name.to_string(),
            cname: format!("{name} 電信"),
            customer_no: "C-001".to_string(),
            upstream_as: "3462".to_string(),
            primary_contact: "NOC".to_string(),
            to: to.to_string(),
            cc: "cc1@example.net;cc2@example.net;".to_string(),
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
            created_by: owner(),
        }
    }

    fn task(v4: &str, v6: &str) -> PrefixListTask {
        PrefixListTask {
            id: 7,
            update_type: UpdateType::Add,
            isps: Vec::new(),
            isp_groups: Vec::new(),
            origin_as: "AS17408".to_string(),
            as_path: "17408 3462".to_string(),
            ipv4_prefix_list: v4.to_string(),
            ipv6_prefix_list: v6.to_string(),
            subject_warning: "URGENT".to_string(),
            related_ticket: String::new(),
            loa_remark: "LOA signed by <CTO>".to_string(),
            remark: String::new(),
            mail_sent_time: String::new(),
            files: Vec::new(),
            created_by: owner(),
        }
    }

    #[test]
    fn test_ip_type_and_prefix_lines() {
        assert_eq!(ip_type(&task("10.0.0.0/8", "")), "ipv4");
        assert_eq!(ip_type(&task("", "2001:db8::/32")), "ipv6");
        assert_eq!(ip_type(&task("10.0.0.0/8", "2001:db8::/32")), "ipv4 & ipv6");
        assert_eq!(
            prefix_lines("10.0.0.0/8 le 24,\r\n192.168.0.0/16,\r\n"),
            vec!["10.0.0.0/8 le 24", "192.168.0.0/16"]
        );
    }

    #[test]
    fn test_hinet_is_ordered_first() {
        let ordered = order_recipients(
            vec![
                isp(1, "TFN", "noc@tfn.net", IpVersion::V4),
                isp(2, "HiNet", HINET, IpVersion::V4),
                isp(3, "Seednet", "noc@seed.net", IpVersion::V4),
            ],
            HINET,
        );
        assert_eq!(
            ordered.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![2, 1, 3]
        );
    }

    #[test]
    fn test_skip_reasons_follow_ip_version() {
        let v4_only = task("10.0.0.0/8", "");
        assert_eq!(
            skip_reason(&isp(1, "V6", "v6@isp.net", IpVersion::V6), &v4_only).as_deref(),
            Some("V6(v6@isp.net) - 缺少 IPv6 prefix")
        );
        assert!(skip_reason(&isp(1, "V4", "v4@isp.net", IpVersion::V4), &v4_only).is_none());
        assert!(skip_reason(&isp(1, "Dual", "d@isp.net", IpVersion::Dual), &v4_only).is_none());
        assert_eq!(
            skip_reason(&isp(1, "Dual", "d@isp.net", IpVersion::Dual), &task("", "")).as_deref(),
            Some("Dual(d@isp.net) - 需要同時有 IPv4 與 IPv6 prefix")
        );
    }

    #[test]
    fn test_subject_and_layout() {
        let t = task("10.0.0.0/8", "");
        let mut english = isp(1, "NTT", "noc@ntt.net", IpVersion::V4);
        english.eng_mail_type = true;
        assert_eq!(layout(&english, HINET), LetterLayout::English);
        assert_eq!(
            subject(&english, &t),
            "[CHIEF TELECOM] -- Please add new BGP entry for our customer - AS17408 URGENT"
        );

        let hinet = isp(2, "HiNet", HINET, IpVersion::V4);
        assert_eq!(layout(&hinet, HINET), LetterLayout::Hinet);
        assert!(subject(&hinet, &t).starts_with("[是方電訊]"));

        let mut custom = isp(3, "TFN", "noc@tfn.net", IpVersion::V4);
        custom.subject = "Prefix update for AS17408".to_string();
        assert_eq!(subject(&custom, &t), "Prefix update for AS17408");
    }

    #[test]
    fn test_hinet_letter_carries_escaped_loa_remark() {
        let t = task("10.0.0.0/8", "");
        let html = render_letter(&isp(2, "HiNet", HINET, IpVersion::V4), &t, LetterLayout::Hinet);
        assert!(html.contains("<li>10.0.0.0/8</li>"));
        assert!(html.contains("LOA signed by &lt;CTO&gt;"));

        let chinese = render_letter(&isp(1, "TFN", "noc@tfn.net", IpVersion::V4), &t, LetterLayout::Chinese);
        assert!(!chinese.contains("LOA"));
        assert!(strip_tags(&chinese).contains("本公司客戶 AS17408 需新增"));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>A &amp; B</p>\n\n\n<p>C</p>"), "A & B\n\nC");
    }

    #[tokio::test]
    async fn test_send_letters_collects_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let path = storage.save("telecom", "loa.pdf", b"%PDF").await.unwrap();

        let mut t = task("10.0.0.0/8", "");
        t.files.push(TaskFile {
            kind: FileKind::Loa,
            file_id: 1,
            name: "LOA.pdf".to_string(),
            file_path: path,
            isp_id: 2,
        });

        let mailer = MemoryMailer::new();
        mailer.fail_for("noc@broken.net");
        let report = send_letters(
            &mailer,
            &storage,
            "T21 <t21@chief.com.tw>",
            HINET,
            &t,
            vec![
                isp(1, "Broken", "noc@broken.net", IpVersion::V4),
                isp(2, "HiNet", HINET, IpVersion::V4),
                isp(3, "V6", "v6@isp.net", IpVersion::V6),
            ],
        )
        .await;

        assert_eq!(report.sent, vec![format!("HiNet({HINET})")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.skipped.len(), 1);

        let sent = mailer.sent();
        assert_eq!(sent[0].cc, vec!["cc1@example.net", "cc2@example.net"]);
        assert_eq!(sent[0].attachments[0].filename, "LOA.pdf");
        assert!(sent[0].html.as_deref().unwrap().contains("<ul>"));
    }

    #[tokio::test]
    async fn test_missing_attachment_fails_only_its_letter() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let path = storage.save("telecom", "loa.pdf", b"%PDF").await.unwrap();
        storage.delete(&path).await.unwrap();

        let mut t = task("10.0.0.0/8", "");
        t.files.push(TaskFile {
            kind: FileKind::Loa,
            file_id: 1,
            name: "LOA.pdf".to_string(),
            file_path: path,
            isp_id: 1,
        });

        let mailer = MemoryMailer::new();
        let report = send_letters(
            &mailer,
            &storage,
            "T21 <t21@chief.com.tw>",
            HINET,
            &t,
            vec![
                isp(3, "Seednet", "noc@seed.net", IpVersion::V4),
                isp(2, "HiNet", HINET, IpVersion::V4),
                isp(1, "TFN", "noc@tfn.net", IpVersion::V4),
            ],
        )
        .await;

        assert_eq!(
            report.sent,
            vec![format!("HiNet({HINET})"), "Seednet(noc@seed.net)".to_string()]
        );
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].starts_with("TFN(noc@tfn.net) - "));
        assert_eq!(mailer.sent().len(), 2);
    }
}
