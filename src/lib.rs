// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CTDB: internal business database for a telecom operator.
//!
//! This crate provides the JSON API for staff diaries, reminders, archives,
//! department calendars and the ISP prefix-list update workflow, plus the
//! scheduled jobs that send reminders and missing-diary notices.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validators;

use std::sync::Arc;

use config::Config;
use db::Db;
use services::{FileStorage, Mailer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub mailer: Arc<dyn Mailer>,
    pub storage: FileStorage,
}

impl AppState {
    /// Today in the configured time zone.
    pub fn today(&self) -> chrono::NaiveDate {
        time_utils::today(self.config.time_zone)
    }
}
