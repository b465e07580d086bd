// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod account;
pub mod archive;
pub mod calendar;
pub mod day;
pub mod diary;
pub mod log;
pub mod news;
pub mod reminder;
pub mod telecom;
pub mod terms;

pub use account::{Group, GroupProfile, Play, Profile, User, UserSummary};
pub use archive::{Archive, ArchiveType};
pub use calendar::{CalendarEvent, FeedEvent};
pub use day::Day;
pub use diary::Diary;
pub use log::LogEntry;
pub use news::News;
pub use reminder::{Reminder, ReminderPolicy};
pub use telecom::{FileKind, IpVersion, Isp, IspGroup, PrefixListTask, TaskFile, TelecomArchive};
pub use terms::{Term, Tool};
