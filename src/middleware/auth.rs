// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware and the per-request user context.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::accounts::{self, Membership};
use crate::error::AppError;
use crate::models::account::{Group, Profile, User, SUPERVISOR_GROUP_NAME};
use crate::services::access::RecordScope;
use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "ctdb_token";

/// Session lifetime in seconds.
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// The authenticated user and everything needed for permission checks.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub profile: Profile,
    pub memberships: Vec<Membership>,
    pub permissions: HashSet<String>,
    pub activated_role: Option<Group>,
    /// Groups supervised by the activated role
    pub supervise_role_ids: Vec<i64>,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn has_perm(&self, codename: &str) -> bool {
        self.user.is_superuser || self.permissions.contains(codename)
    }

    /// Missing permissions look like missing objects.
    pub fn require(&self, codename: &str) -> Result<(), AppError> {
        if self.has_perm(codename) {
            Ok(())
        } else {
            tracing::debug!(user_id = self.id(), permission = codename, "Permission denied");
            Err(AppError::NotFound("Page not found".to_string()))
        }
    }

    pub fn is_member_of(&self, group_id: i64) -> bool {
        self.memberships.iter().any(|m| m.group.id == group_id)
    }

    pub fn is_supervisor(&self) -> bool {
        self.memberships
            .iter()
            .any(|m| m.group.name == SUPERVISOR_GROUP_NAME)
    }

    pub fn department_ids(&self) -> Vec<i64> {
        self.memberships
            .iter()
            .filter(|m| m.is_department)
            .map(|m| m.group.id)
            .collect()
    }

    /// Group names shown in the UI, in membership order.
    pub fn displayed_groups(&self) -> Vec<String> {
        self.memberships
            .iter()
            .filter(|m| m.is_displayed)
            .map(|m| m.group.name.clone())
            .collect()
    }

    pub fn department_scope(&self) -> RecordScope {
        RecordScope::department(&self.department_ids(), &self.supervise_role_ids)
    }

    pub fn personal_scope(&self) -> RecordScope {
        RecordScope::personal(self.id(), &self.supervise_role_ids)
    }

    /// Id of the activated role, used as the calendar department.
    pub fn activated_department(&self) -> Option<i64> {
        self.activated_role.as_ref().map(|g| g.id)
    }
}

/// Load the request context of an active user.
pub fn load_auth_user(conn: &Connection, user_id: i64) -> Result<Option<AuthUser>, AppError> {
    let Some(user) = accounts::get_user(conn, user_id)? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }
    let Some(profile) = accounts::get_profile(conn, user_id)? else {
        return Ok(None);
    };
    let memberships = accounts::user_memberships(conn, user_id)?;
    let permissions = accounts::user_permissions(conn, user_id)?;

    let (activated_role, supervise_role_ids) = match profile.activated_role_id {
        Some(group_id) => {
            let group = accounts::get_group(conn, group_id)?;
            let supervised = accounts::get_group_profile(conn, group_id)?
                .supervise_roles
                .into_iter()
                .map(|g| g.id)
                .collect();
            (group, supervised)
        }
        None => (None, Vec::new()),
    };

    Ok(Some(AuthUser {
        user,
        profile,
        memberships,
        permissions,
        activated_role,
        supervise_role_ids,
    }))
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => bearer_token(&request).ok_or(AppError::Unauthorized)?,
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);
    let token_data =
        decode::<Claims>(&token, &key, &validation).map_err(|_| AppError::Unauthorized)?;
    let user_id: i64 = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized)?;

    let auth_user = state
        .db
        .call(move |conn| load_auth_user(conn, user_id))
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: i64, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_department, seed_user};
    use crate::db::Db;

    #[test]
    fn test_jwt_round_trip() {
        let key = b"test_jwt_key_32_bytes_minimum!!";
        let token = create_jwt(42, key).unwrap();
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(key),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "42");
        assert_eq!(data.claims.exp - data.claims.iat, SESSION_TTL_SECS);
    }

    #[tokio::test]
    async fn test_load_auth_user_scopes_follow_activated_role() {
        let db = Db::open_in_memory().unwrap();
        let (plain, boss) = db
            .call(|conn| {
                let alice = seed_user(conn, "alice");
                let i01 = seed_department(conn, "I01");
                let i02 = seed_department(conn, "I02");
                let managers = seed_department(conn, "I00");
                accounts::add_user_to_group(conn, alice, i01)?;
                accounts::add_user_to_group(conn, alice, managers)?;
                accounts::add_supervise_role(conn, managers, i02)?;
                accounts::grant_user_permission(conn, alice, "diary.view_diary")?;

                let plain = load_auth_user(conn, alice)?.unwrap();
                accounts::set_activated_role(conn, alice, Some(managers))?;
                let boss = load_auth_user(conn, alice)?.unwrap();
                Ok((plain, boss))
            })
            .await
            .unwrap();

        assert_eq!(plain.personal_scope(), RecordScope::Owner(plain.id()));
        assert_eq!(plain.department_ids().len(), 2);
        assert!(plain.has_perm("diary.view_diary"));
        assert!(plain.require("diary.delete_diary").is_err());

        assert_eq!(boss.activated_role.as_ref().unwrap().name, "I00");
        assert_eq!(boss.supervise_role_ids.len(), 1);
        assert!(matches!(boss.personal_scope(), RecordScope::MembersOf(_)));
    }

    #[tokio::test]
    async fn test_inactive_user_has_no_context() {
        let db = Db::open_in_memory().unwrap();
        let loaded = db
            .call(|conn| {
                let bob = seed_user(conn, "bob");
                accounts::set_user_active(conn, bob, false)?;
                load_auth_user(conn, bob)
            })
            .await
            .unwrap();
        assert!(loaded.is_none());
    }
}
