// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use ctdb::error::AppError;
use serde_json::Value;
use validator::Validate;

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_status_codes() {
    let (status, body) = render(AppError::NotFound("Diary 7 not found".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "Diary 7 not found");

    let (status, body) = render(AppError::InvalidCredentials).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("details").is_none());

    let (status, body) = render(AppError::Mail("relay refused".to_string())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "mail_error");
}

#[tokio::test]
async fn test_internal_errors_hide_details() {
    let (status, body) = render(AppError::Database("no such table: diaries".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("details").is_none());

    let (status, body) = render(anyhow::anyhow!("disk full").into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
}

#[derive(Validate)]
struct Contact {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, message = "This field is required."))]
    name: String,
}

#[tokio::test]
async fn test_validation_errors_list_fields() {
    let contact = Contact {
        email: "nobody".to_string(),
        name: String::new(),
    };
    let err: AppError = contact.validate().unwrap_err().into();

    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["fields"]["email"][0], "Please enter a valid email address.");
    assert_eq!(body["fields"]["name"][0], "This field is required.");
}
