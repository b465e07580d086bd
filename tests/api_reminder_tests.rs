// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder routes: form cleaning, department scoping and send-now.

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

const REMINDER_PERMS: &[&str] = &[
    "reminder.view_reminder",
    "reminder.add_reminder",
    "reminder.change_reminder",
    "reminder.delete_reminder",
];

fn reminder(policy: &str) -> Value {
    json!({
        "event": "Certificate renewal",
        "policy": policy,
        "start_at": "2026-05-01",
        "end_at": "2026-06-01",
        "specified_dates": "",
        "email_subject": "Renew the wildcard certificate",
        "email_content": "The certificate expires at the end of the month.",
        "recipients": "ops@chief.com.tw; noc@chief.com.tw;",
    })
}

/// Two members of one department, both allowed to manage reminders.
async fn colleagues(app: &common::TestApp) -> (i64, i64) {
    let alice = app.user("alice", REMINDER_PERMS).await;
    let bob = app.user("bob", REMINDER_PERMS).await;
    let noc = app.department("NOC").await;
    app.join(alice, noc).await;
    app.join(bob, noc).await;
    (alice, bob)
}

#[tokio::test]
async fn test_specified_dates_set_the_range() {
    let app = common::create_test_app();
    let (alice, _) = colleagues(&app).await;

    let mut form = reminder("specified dates");
    form["specified_dates"] = json!("2026-05-20, 2026-05-03,2026-05-11");
    let (status, body) = app.json("POST", "/api/reminders", &app.token(alice), form).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["start_at"], "2026-05-03");
    assert_eq!(body["end_at"], "2026-05-20");
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn test_once_collapses_to_start_date() {
    let app = common::create_test_app();
    let (alice, _) = colleagues(&app).await;

    let (status, body) = app
        .json("POST", "/api/reminders", &app.token(alice), reminder("once"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["end_at"], "2026-05-01");
}

#[tokio::test]
async fn test_bad_recipients_and_dates_are_rejected() {
    let app = common::create_test_app();
    let (alice, _) = colleagues(&app).await;
    let token = app.token(alice);

    let mut form = reminder("daily");
    form["recipients"] = json!("ops@chief.com.tw; not-an-address");
    let (status, body) = app.json("POST", "/api/reminders", &token, form).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["recipients"].is_array());

    let mut form = reminder("specified dates");
    form["specified_dates"] = json!("2026-05-01,May 3rd");
    let (status, body) = app.json("POST", "/api/reminders", &token, form).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["specified_dates"].is_array());
}

#[tokio::test]
async fn test_department_members_share_but_only_author_edits() {
    let app = common::create_test_app();
    let (alice, bob) = colleagues(&app).await;
    let outsider = app.user("mallory", REMINDER_PERMS).await;

    let (_, created) = app
        .json("POST", "/api/reminders", &app.token(alice), reminder("daily"))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app.get(&format!("/api/reminders/{id}"), &app.token(bob)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/api/reminders/{id}"), &app.token(outsider))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json("PUT", &format!("/api/reminders/{id}"), &app.token(bob), reminder("hourly"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = app.get("/api/reminders", &app.token(bob)).await;
    assert_eq!(all["count"], 1);
    let (_, own) = app.get("/api/reminders?created_by=me", &app.token(bob)).await;
    assert_eq!(own["count"], 0);

    let (status, updated) = app
        .json("PUT", &format!("/api/reminders/{id}"), &app.token(alice), reminder("hourly"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["policy"], "hourly");
}

#[tokio::test]
async fn test_send_now_mails_recipients() {
    let app = common::create_test_app();
    let (alice, _) = colleagues(&app).await;
    let token = app.token(alice);

    let (_, created) = app.json("POST", "/api/reminders", &token, reminder("daily")).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app.post(&format!("/api/reminders/{id}/send"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], true);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ops@chief.com.tw", "noc@chief.com.tw"]);
    assert_eq!(sent[0].subject, "Renew the wildcard certificate");
}

#[tokio::test]
async fn test_clone_keeps_schedule() {
    let app = common::create_test_app();
    let (alice, _) = colleagues(&app).await;
    let token = app.token(alice);

    let (_, created) = app.json("POST", "/api/reminders", &token, reminder("on weekdays")).await;
    let id = created["id"].as_i64().unwrap();

    let (status, cloned) = app.post(&format!("/api/reminders/{id}/clone"), &token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(cloned["id"], created["id"]);
    assert_eq!(cloned["policy"], "on weekdays");
    assert_eq!(cloned["event"], "Certificate renewal");
}
