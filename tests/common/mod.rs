// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use ctdb::config::Config;
use ctdb::db::accounts::{self, NewGroup, NewUser};
use ctdb::db::Db;
use ctdb::middleware::auth::create_jwt;
use ctdb::routes::create_router;
use ctdb::services::{passwords, FileStorage, Mailer, MemoryMailer};
use ctdb::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Password of every seeded user.
#[allow(dead_code)]
pub const PASSWORD: &str = "correct horse";

/// Router plus handles to its in-memory dependencies.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<MemoryMailer>,
    _media: tempfile::TempDir,
}

/// Create a test app on an in-memory database with a recording mailer.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(|_| {})
}

/// Like [`create_test_app`], adjusting the configuration first.
#[allow(dead_code)]
pub fn create_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let media = tempfile::tempdir().expect("temp media dir");
    let mut config = Config::test_default();
    configure(&mut config);
    config.media_root = media.path().to_path_buf();

    let db = Db::open_in_memory().expect("in-memory database");
    let mailer = Arc::new(MemoryMailer::new());
    let storage = FileStorage::new(media.path());

    let state = Arc::new(AppState {
        config,
        db,
        mailer: mailer.clone() as Arc<dyn Mailer>,
        storage,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        mailer,
        _media: media,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Seed an active user holding `permissions` directly.
    pub async fn user(&self, username: &str, permissions: &[&str]) -> i64 {
        let username = username.to_string();
        let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
        let password_hash = passwords::hash_password(PASSWORD, 1_000).unwrap();
        self.state
            .db
            .call(move |conn| {
                let id = accounts::create_user(
                    conn,
                    &NewUser {
                        email: format!("{username}@chief.com.tw"),
                        username,
                        first_name: String::new(),
                        last_name: String::new(),
                        password_hash,
                        is_superuser: false,
                        boss_id: None,
                        keep_diary: false,
                        diary_starting_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    },
                )?;
                for codename in &permissions {
                    accounts::grant_user_permission(conn, id, codename)?;
                }
                Ok(id)
            })
            .await
            .unwrap()
    }

    /// Seed a displayed department group.
    pub async fn department(&self, name: &str) -> i64 {
        let name = name.to_string();
        self.state
            .db
            .call(move |conn| {
                Ok(accounts::create_group(
                    conn,
                    &NewGroup {
                        name,
                        is_department: true,
                        is_displayed: true,
                        ..Default::default()
                    },
                )?)
            })
            .await
            .unwrap()
    }

    /// Seed a plain (non-department) group.
    pub async fn group(&self, name: &str) -> i64 {
        let name = name.to_string();
        self.state
            .db
            .call(move |conn| {
                Ok(accounts::create_group(
                    conn,
                    &NewGroup {
                        name,
                        ..Default::default()
                    },
                )?)
            })
            .await
            .unwrap()
    }

    pub async fn join(&self, user_id: i64, group_id: i64) {
        self.state
            .db
            .call(move |conn| Ok(accounts::add_user_to_group(conn, user_id, group_id)?))
            .await
            .unwrap()
    }

    pub async fn supervise(&self, group_id: i64, supervised: i64) {
        self.state
            .db
            .call(move |conn| Ok(accounts::add_supervise_role(conn, group_id, supervised)?))
            .await
            .unwrap()
    }

    pub async fn activate(&self, user_id: i64, group_id: i64) {
        self.state
            .db
            .call(move |conn| Ok(accounts::set_activated_role(conn, user_id, Some(group_id))?))
            .await
            .unwrap()
    }

    pub fn token(&self, user_id: i64) -> String {
        create_jwt(user_id, &self.state.config.jwt_signing_key).unwrap()
    }

    /// Send a request, returning the status and the JSON body (`Null` when empty).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn json(&self, method: &str, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST a multipart form built by [`multipart_body`].
    pub async fn multipart(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> (StatusCode, Value) {
        let (content_type, body) = multipart_body(fields, files);
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

/// Encode text fields and `(field, file name, content)` parts as
/// `multipart/form-data`.
#[allow(dead_code)]
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "ctdb-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
