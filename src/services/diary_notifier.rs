// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Missing-diary notifications.
//!
//! Diary keepers owe one diary per working day from their starting date up
//! to yesterday. The longer the oldest gap, the further up the boss chain
//! the notice is copied.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::db::{self, Db};
use crate::error::AppError;
use crate::services::mailer::{Mailer, OutgoingMail};
use crate::time_utils::date_range;

/// Days since the oldest missing diary at which one more boss is copied.
pub const THRESHOLDS: [i64; 3] = [3, 7, 30];

/// Working days in `[start, today)`: weekdays that are not holidays plus extra
/// workdays in the same range.
pub fn required_dates(
    start: NaiveDate,
    today: NaiveDate,
    holidays: &HashSet<NaiveDate>,
    extra_workdays: &HashSet<NaiveDate>,
) -> BTreeSet<NaiveDate> {
    date_range(start, today)
        .filter(|date| {
            let weekday = !matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            (weekday && !holidays.contains(date)) || extra_workdays.contains(date)
        })
        .collect()
}

/// Number of thresholds reached by `past_days`.
pub fn notification_level(past_days: i64) -> usize {
    THRESHOLDS.iter().take_while(|t| past_days >= **t).count()
}

/// Boss addresses `level` steps up from `user_id`. Bosses without an
/// address are passed over but still count as a step.
pub fn cc_chain(
    user_id: i64,
    level: usize,
    bosses: &HashMap<i64, (Option<i64>, String)>,
) -> Vec<String> {
    let mut cc = Vec::new();
    let mut current = user_id;
    for _ in 0..level {
        let Some(boss) = bosses.get(&current).and_then(|(boss, _)| *boss) else {
            break;
        };
        if let Some((_, email)) = bosses.get(&boss) {
            if !email.is_empty() {
                cc.push(email.clone());
            }
        }
        current = boss;
    }
    cc
}

/// A notice for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryNotice {
    pub user_id: i64,
    pub username: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub level: usize,
}

impl DiaryNotice {
    pub fn subject(&self) -> String {
        format!(
            "[CTDB] {} 日誌未填寫通知 ({} 天)",
            self.username,
            self.dates.len()
        )
    }

    pub fn body(&self) -> String {
        let dates = self
            .dates
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} 您好，\n\n系統查無您以下日期的工作日誌，請儘速補上：\n\n{}\n\n此信件由系統自動發送，請勿直接回覆。",
            self.username, dates
        )
    }

    pub fn mail(&self, from: &str) -> OutgoingMail {
        OutgoingMail {
            from: from.to_string(),
            to: self.to.clone(),
            cc: self.cc.clone(),
            subject: self.subject(),
            text: self.body(),
            ..Default::default()
        }
    }
}

/// Build a notice for every diary keeper with missing dates as of `today`.
pub async fn collect_notices(db: &Db, today: NaiveDate) -> Result<Vec<DiaryNotice>, AppError> {
    db.call(move |conn| {
        let keepers = db::accounts::diary_keepers(conn)?;
        let (holidays, extra_workdays) = db::day::exceptions(conn)?;
        let written = db::diary::written_dates(conn)?;
        let bosses = db::accounts::boss_links(conn)?;

        let mut notices = Vec::new();
        for (user, profile) in keepers {
            let dates: Vec<NaiveDate> = required_dates(
                profile.diary_starting_date,
                today,
                &holidays,
                &extra_workdays,
            )
            .into_iter()
            .filter(|date| !written.contains(&(user.id, *date)))
            .collect();
            let Some(earliest) = dates.first() else {
                continue;
            };

            let level = notification_level((today - *earliest).num_days());
            notices.push(DiaryNotice {
                user_id: user.id,
                cc: cc_chain(user.id, level, &bosses),
                to: if user.email.is_empty() {
                    Vec::new()
                } else {
                    vec![user.email.clone()]
                },
                username: user.username,
                dates,
                level,
            });
        }
        Ok(notices)
    })
    .await
}

/// Mail each notice. Returns how many were delivered.
pub async fn send_notices(mailer: &dyn Mailer, from: &str, notices: &[DiaryNotice]) -> usize {
    let mut sent = 0;
    for notice in notices {
        if notice.to.is_empty() {
            tracing::warn!(user_id = notice.user_id, "Diary keeper has no e-mail address");
            continue;
        }
        match mailer.send(&notice.mail(from)).await {
            Ok(()) => {
                tracing::info!(
                    user_id = notice.user_id,
                    missing = notice.dates.len(),
                    level = notice.level,
                    "Diary notice sent"
                );
                sent += 1;
            }
            Err(e) => {
                tracing::error!(user_id = notice.user_id, error = %e, "Failed to send diary notice")
            }
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::accounts::{self, NewUser};
    use crate::models::day::DayForm;
    use crate::models::diary::DiaryForm;
    use crate::services::mailer::MemoryMailer;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_required_dates_skip_weekends_and_holidays() {
        // Mon 2024-05-06 .. Sun 2024-05-12
        let holidays = HashSet::from([date("2024-05-08")]);
        let extra = HashSet::from([date("2024-05-11"), date("2023-01-07")]);
        let dates: Vec<_> = required_dates(date("2024-05-06"), date("2024-05-13"), &holidays, &extra)
            .into_iter()
            .collect();
        assert_eq!(
            dates,
            vec![
                date("2024-05-06"),
                date("2024-05-07"),
                date("2024-05-09"),
                date("2024-05-10"),
                date("2024-05-11"),
            ]
        );
    }

    #[test]
    fn test_notification_level_counts_thresholds() {
        assert_eq!(notification_level(0), 0);
        assert_eq!(notification_level(2), 0);
        assert_eq!(notification_level(3), 1);
        assert_eq!(notification_level(7), 2);
        assert_eq!(notification_level(29), 2);
        assert_eq!(notification_level(30), 3);
        assert_eq!(notification_level(400), 3);
    }

    #[test]
    fn test_cc_chain_walks_bosses() {
        let bosses = HashMap::from([
            (1, (Some(2), "staff@chief.com.tw".to_string())),
            (2, (Some(3), "lead@chief.com.tw".to_string())),
            (3, (Some(4), String::new())),
            (4, (None, "ceo@chief.com.tw".to_string())),
        ]);
        assert!(cc_chain(1, 0, &bosses).is_empty());
        assert_eq!(cc_chain(1, 1, &bosses), vec!["lead@chief.com.tw"]);
        assert_eq!(
            cc_chain(1, 3, &bosses),
            vec!["lead@chief.com.tw", "ceo@chief.com.tw"]
        );
        assert_eq!(cc_chain(4, 3, &bosses), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_collect_and_send_notices() {
        let db = Db::open_in_memory().unwrap();
        db.call(|conn| {
            let boss = accounts::create_user(
                conn,
                &NewUser {
                    username: "boss".to_string(),
                    email: "boss@chief.com.tw".to_string(),
                    first_name: String::new(),
                    last_name: String::new(),
                    password_hash: String::new(),
                    is_superuser: false,
                    boss_id: None,
                    keep_diary: false,
                    diary_starting_date: date("2024-01-01"),
                },
            )?;
            let staff = accounts::create_user(
                conn,
                &NewUser {
                    username: "staff".to_string(),
                    email: "staff@chief.com.tw".to_string(),
                    first_name: String::new(),
                    last_name: String::new(),
                    password_hash: String::new(),
                    is_superuser: false,
                    boss_id: Some(boss),
                    keep_diary: true,
                    diary_starting_date: date("2024-05-06"),
                },
            )?;
            db::day::insert(
                conn,
                &DayForm {
                    date: date("2024-05-08"),
                    is_holiday: true,
                    description: String::new(),
                },
            )?;
            db::diary::insert(
                conn,
                staff,
                &DiaryForm {
                    date: date("2024-05-07"),
                    content: "done".to_string(),
                    todo: String::new(),
                    remark: String::new(),
                },
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let notices = collect_notices(&db, date("2024-05-10")).await.unwrap();
        assert_eq!(notices.len(), 1);
        let notice = &notices[0];
        assert_eq!(notice.dates, vec![date("2024-05-06"), date("2024-05-09")]);
        assert_eq!(notice.level, 1);
        assert_eq!(notice.cc, vec!["boss@chief.com.tw"]);
        assert!(notice.body().contains("2024-05-06, 2024-05-09"));

        let mailer = MemoryMailer::new();
        assert_eq!(send_notices(&mailer, "TDB <TDB@chief.com.tw>", &notices).await, 1);
        assert_eq!(mailer.sent()[0].to, vec!["staff@chief.com.tw"]);
    }
}
