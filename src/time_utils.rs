// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for local date/time handling.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Current time in the configured zone.
pub fn now_local(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Current local date in the configured zone.
pub fn today(tz: Tz) -> NaiveDate {
    now_local(tz).date_naive()
}

/// `YYYY-MM-DD HH:MM:SS`, the format of recorded send times.
pub fn format_local_timestamp(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// ISO 8601 without offset, as consumed by the calendar frontend.
pub fn format_iso_local(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Every date in `[start, end)`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_excludes_end() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days: Vec<_> = date_range(start, end).collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(date_range(end, start).count(), 0);
    }

    #[test]
    fn test_formats() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(format_local_timestamp(dt), "2024-05-06 09:05:00");
        assert_eq!(format_iso_local(dt), "2024-05-06T09:05:00");
    }
}
