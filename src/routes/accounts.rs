// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current user, activated role and group membership lookups.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::account::{Group, Profile, UserSummary};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/activated-role", put(set_activated_role))
        .route("/api/groups/{id}/members", get(group_members))
}

/// Current user response.
#[derive(Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_superuser: bool,
    pub profile: Profile,
    pub groups: Vec<String>,
    pub default_group: Option<String>,
    pub is_supervisor: bool,
    pub activated_role: Option<Group>,
    pub permissions: Vec<String>,
}

impl From<&AuthUser> for MeResponse {
    fn from(auth: &AuthUser) -> Self {
        let groups = auth.displayed_groups();
        let mut permissions: Vec<String> = auth.permissions.iter().cloned().collect();
        permissions.sort();
        Self {
            id: auth.id(),
            username: auth.user.username.clone(),
            name: auth.user.display_name(),
            email: auth.user.email.clone(),
            is_superuser: auth.user.is_superuser,
            profile: auth.profile.clone(),
            default_group: groups.first().cloned(),
            groups,
            is_supervisor: auth.is_supervisor(),
            activated_role: auth.activated_role.clone(),
            permissions,
        }
    }
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse::from(&user))
}

#[derive(Deserialize)]
pub struct ActivatedRoleRequest {
    group_id: Option<i64>,
}

/// Switch the role the user acts as. Only own groups can be activated.
async fn set_activated_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ActivatedRoleRequest>,
) -> Result<Json<MeResponse>> {
    if let Some(group_id) = body.group_id {
        if !user.is_member_of(group_id) {
            return Err(AppError::field(
                "group_id",
                "You can only activate a group you belong to.",
            ));
        }
    }

    let user_id = user.id();
    let updated = state
        .db
        .call(move |conn| {
            db::accounts::set_activated_role(conn, user_id, body.group_id)?;
            crate::middleware::auth::load_auth_user(conn, user_id)
        })
        .await?
        .ok_or(AppError::Unauthorized)?;

    tracing::info!(user_id, group_id = ?body.group_id, "Activated role changed");
    Ok(Json(MeResponse::from(&updated)))
}

/// Active members of a group the user belongs to or supervises.
async fn group_members(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>> {
    let allowed = user.user.is_superuser
        || user.is_member_of(group_id)
        || user.supervise_role_ids.contains(&group_id);
    if !allowed {
        return Err(AppError::NotFound(format!("Group {group_id} not found")));
    }

    let members = state
        .db
        .call(move |conn| Ok(db::accounts::group_members(conn, group_id, true)?))
        .await?;
    Ok(Json(members.iter().map(UserSummary::from).collect()))
}
