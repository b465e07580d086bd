// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password login and logout.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::services::passwords::verify_password;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or e-mail address
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Check credentials and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let login = body.username.trim().to_string();
    if login.is_empty() || body.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let found = state
        .db
        .call(move |conn| Ok(db::accounts::find_login(conn, &login)?))
        .await?;

    let user = match found {
        Some((user, hash)) if user.is_active && verify_password(&body.password, &hash) => user,
        Some((user, _)) => {
            tracing::warn!(user_id = user.id, "Rejected login");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            tracing::warn!(login = %body.username.trim(), "Login for unknown user");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = create_jwt(user.id, &state.config.jwt_signing_key)?;
    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    let jar = jar.add(session_cookie(token.clone(), state.config.secure_cookies));
    Ok((
        jar,
        Json(LoginResponse {
            token,
            user_id: user.id,
            username: user.username,
        }),
    ))
}

/// End the session by removing the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = Cookie::build(SESSION_COOKIE)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies);
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), true).to_string();
        assert!(cookie.starts_with("ctdb_token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains(&format!("Max-Age={SESSION_TTL_SECS}")));
    }
}
