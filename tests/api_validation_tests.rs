// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests for the admin-managed calendars.

use axum::http::StatusCode;
use serde_json::json;

mod common;

const DAY_PERMS: &[&str] = &["day.view_day", "day.add_day", "day.change_day"];

#[tokio::test]
async fn test_day_date_must_be_unique() {
    let app = common::create_test_app();
    let user = app.user("alice", DAY_PERMS).await;
    let token = app.token(user);

    let (status, _) = app
        .json("POST", "/api/days", &token, json!({ "date": "2026-02-16", "description": "Lunar New Year" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .json("POST", "/api/days", &token, json!({ "date": "2026-02-16" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["date"][0], "Day with this Date already exists.");
}

#[tokio::test]
async fn test_day_description_too_long() {
    let app = common::create_test_app();
    let user = app.user("alice", DAY_PERMS).await;

    let (status, body) = app
        .json(
            "POST",
            "/api/days",
            &app.token(user),
            json!({ "date": "2026-02-17", "description": "a".repeat(256) }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["description"].is_array());
}

#[tokio::test]
async fn test_days_filter_by_year() {
    let app = common::create_test_app();
    let user = app.user("alice", DAY_PERMS).await;
    let token = app.token(user);
    for date in ["2025-10-10", "2026-01-01", "2026-10-10"] {
        app.json("POST", "/api/days", &token, json!({ "date": date })).await;
    }

    let (status, days) = app.get("/api/days?year=2026", &token).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = days
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2026-10-10", "2026-01-01"]);
    assert_eq!(days[0]["is_holiday"], true);
}

#[tokio::test]
async fn test_malformed_date_is_rejected() {
    let app = common::create_test_app();
    let user = app.user("alice", DAY_PERMS).await;

    let (status, _) = app
        .json("POST", "/api/days", &app.token(user), json!({ "date": "Feb 16" }))
        .await;
    assert!(status.is_client_error());
}
