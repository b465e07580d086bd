// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monthly meeting calendar ingestion.
//!
//! The first worksheet has a title row and a header row, then one meeting per
//! row with the department in column B, the meeting time in column C and the
//! room in column D. Each meeting becomes a `once` reminder a week ahead.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use chrono::{Duration, NaiveDateTime};

use crate::db::{self, Db};
use crate::error::AppError;
use crate::models::reminder::{ReminderDraft, ReminderPolicy};

/// Rows before the first meeting.
const SKIPPED_ROWS: u32 = 2;
const DEPARTMENT_COL: u32 = 1;
const TIME_COL: u32 = 2;
const ROOM_COL: u32 = 3;

const REMIND_DAYS_BEFORE: i64 = 7;

/// The all-hands meeting is named as-is and goes to every division.
const ALL_HANDS: &str = "工程師大會";

const DEPARTMENT_EMAILS: &[(&str, &[&str])] = &[
    (
        "I00",
        &[
            "i00@chief.com.tw",
            "i00_manager@chief.com.tw",
            "gino_kao@chief.com.tw",
            "kenny_jan@chief.com.tw",
            "morris_fu@chief.com.tw",
            "aaron_lin@chief.com.tw",
            "ryan_hsiao@chief.com.tw",
            "eric_wu@chief.com.tw",
            "hank_tsai@chief.com.tw",
            "louis_wen@chief.com.tw",
            "ken@chief.com.tw",
            "brian_chiang@chief.com.tw",
            "jenny_hung@chief.com.tw",
        ],
    ),
    ("I01", &["i00@chief.com.tw", "i01@chief.com.tw"]),
    ("I02", &["i00@chief.com.tw", "i02@chief.com.tw"]),
    ("I03", &["i00@chief.com.tw", "i03@chief.com.tw"]),
    ("I04", &["i00@chief.com.tw", "i04@chief.com.tw"]),
    (
        ALL_HANDS,
        &[
            "i00@chief.com.tw",
            "i01@chief.com.tw",
            "i02@chief.com.tw",
            "i03@chief.com.tw",
            "i04@chief.com.tw",
        ],
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("cannot read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("row {row}: {message}")]
    Row { row: u32, message: String },
}

impl From<SpreadsheetError> for AppError {
    fn from(err: SpreadsheetError) -> Self {
        AppError::BadRequest(format!("轉換失敗：{err}"))
    }
}

/// One row of the meeting calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub department: String,
    pub time: NaiveDateTime,
    pub room: String,
}

/// `;`-joined mailing list for a department.
pub fn department_recipients(department: &str) -> String {
    DEPARTMENT_EMAILS
        .iter()
        .find(|(name, _)| *name == department)
        .map(|(_, emails)| emails.join(";"))
        .unwrap_or_else(|| format!("{}@chief.com.tw", department.to_lowercase()))
}

fn cell_text(range: &Range<Data>, row: u32, col: u32) -> String {
    range
        .get_value((row, col))
        .map(|cell| cell.to_string().trim().to_string())
        .unwrap_or_default()
}

fn cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    if let Data::String(text) = cell {
        let text = text.trim();
        return ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y/%m/%d %H:%M:%S", "%Y/%m/%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok());
    }
    cell.as_datetime()
}

/// Meetings listed in `range`. Rows without a department are ignored.
pub fn meetings_from_range(range: &Range<Data>) -> Result<Vec<Meeting>, SpreadsheetError> {
    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    let mut meetings = Vec::new();
    for row in SKIPPED_ROWS..=last_row {
        let department = cell_text(range, row, DEPARTMENT_COL);
        if department.is_empty() {
            continue;
        }
        let time = range
            .get_value((row, TIME_COL))
            .and_then(cell_datetime)
            .ok_or_else(|| SpreadsheetError::Row {
                row: row + 1,
                message: format!(
                    "\"{}\" is not a meeting time",
                    cell_text(range, row, TIME_COL)
                ),
            })?;
        meetings.push(Meeting {
            department,
            time,
            room: cell_text(range, row, ROOM_COL),
        });
    }
    Ok(meetings)
}

/// Read the meetings from the first worksheet of the workbook at `path`.
pub fn read_meetings(path: &Path) -> Result<Vec<Meeting>, SpreadsheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoWorksheet)??;
    meetings_from_range(&range)
}

/// The `once` reminder sent a week before `meeting`.
pub fn meeting_reminder(meeting: &Meeting) -> ReminderDraft {
    let event = if meeting.department.contains(ALL_HANDS) {
        meeting.department.clone()
    } else {
        format!("{} 月會", meeting.department)
    };
    let remind_on = (meeting.time - Duration::days(REMIND_DAYS_BEFORE)).date();

    ReminderDraft {
        email_subject: format!("提醒：{event} ({})", meeting.time.format("%Y-%m-%d %H:%M")),
        email_content: format!(
            "親愛的同仁，\n\n提醒您參加以下會議：\n\n• 會議名稱：{event}\n• 會議時間：{}\n• 會議地點：{}\n\n請準時參加，謝謝！",
            meeting.time.format("%Y年%m月%d日 %H:%M"),
            meeting.room
        ),
        recipients: department_recipients(&meeting.department),
        event,
        policy: ReminderPolicy::Once,
        start_at: remind_on,
        end_at: remind_on,
        specified_dates: String::new(),
        is_active: true,
    }
}

/// Create a reminder per meeting in the workbook, all or nothing.
/// Returns how many were created.
pub async fn convert_to_reminders(
    db: &Db,
    workbook: &Path,
    created_by: i64,
) -> Result<usize, AppError> {
    let path = workbook.to_path_buf();
    let meetings = tokio::task::spawn_blocking(move || read_meetings(&path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spreadsheet task failed: {}", e)))??;
    let drafts: Vec<ReminderDraft> = meetings.iter().map(meeting_reminder).collect();

    let created = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            for draft in &drafts {
                db::reminder::insert(&tx, created_by, draft)?;
            }
            tx.commit()?;
            Ok(drafts.len())
        })
        .await?;

    tracing::info!(created, created_by, "Meeting calendar converted to reminders");
    Ok(created)
}
