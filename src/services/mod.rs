// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod access;
pub mod diary_notifier;
pub mod mailer;
pub mod passwords;
pub mod reminder_schedule;
pub mod spreadsheet;
pub mod storage;
pub mod task_mail;

pub use access::RecordScope;
pub use mailer::{build_mailer, Mailer, MemoryMailer, OutgoingMail};
pub use storage::FileStorage;
