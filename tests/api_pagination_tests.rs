// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! List pagination through the news endpoint.
//!
//! These tests verify that:
//! 1. Lists are split into pages of five
//! 2. Page numbers out of range or not numeric never fail the request
//! 3. `page=all` returns everything

use axum::http::StatusCode;
use serde_json::json;

mod common;

const NEWS_PERMS: &[&str] = &["news.view_news", "news.add_news"];

/// Seed `count` news items dated one day apart and return a token.
async fn with_news(app: &common::TestApp, count: u32) -> String {
    let user = app.user("alice", NEWS_PERMS).await;
    let token = app.token(user);
    for day in 1..=count {
        let (status, _) = app
            .json(
                "POST",
                "/api/news",
                &token,
                json!({ "title": format!("Maintenance {day}"), "at": format!("2026-01-{day:02}") }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    token
}

#[tokio::test]
async fn test_first_page_is_default() {
    let app = common::create_test_app();
    let token = with_news(&app, 12).await;

    let (status, page) = app.get("/api/news", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["num_pages"], 3);
    assert_eq!(page["count"], 12);
    assert_eq!(page["is_paginated"], true);
    assert_eq!(page["has_next"], true);
    assert_eq!(page["has_previous"], false);
    assert_eq!(page["items"].as_array().unwrap().len(), 5);
    assert_eq!(page["items"][0]["title"], "Maintenance 12");
}

#[tokio::test]
async fn test_out_of_range_page_is_last_page() {
    let app = common::create_test_app();
    let token = with_news(&app, 12).await;

    for uri in ["/api/news?page=99", "/api/news?page=0", "/api/news?page=-3"] {
        let (status, page) = app.get(uri, &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["page"], 3);
        assert_eq!(page["has_next"], false);
        assert_eq!(page["items"].as_array().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_non_numeric_page_is_first_page() {
    let app = common::create_test_app();
    let token = with_news(&app, 7).await;

    let (status, page) = app.get("/api/news?page=last", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
}

#[tokio::test]
async fn test_page_all_disables_pagination() {
    let app = common::create_test_app();
    let token = with_news(&app, 7).await;

    let (_, page) = app.get("/api/news?page=all", &token).await;
    assert_eq!(page["is_paginated"], false);
    assert_eq!(page["items"].as_array().unwrap().len(), 7);
}
