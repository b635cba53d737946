use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::RoleName;
use crate::repositories;

/// The authenticated identity: the user row plus its flattened role set.
/// Handlers receive this explicitly instead of digging it out of request
/// extensions.
#[derive(Debug, Clone)]
pub(crate) struct AuthUser {
    pub(crate) user: User,
    pub(crate) roles: Vec<RoleName>,
}

impl AuthUser {
    pub(crate) fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.has_role(RoleName::Admin)
    }
}

pub(crate) struct CurrentUser(pub(crate) AuthUser);
pub(crate) struct CurrentAdmin(pub(crate) AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Not authenticated"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Not authenticated"))?;

        // A present but unverifiable token is a 403, not a 401.
        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Forbidden("Invalid or expired token"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        let roles = repositories::roles::list_for_user(app_state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user roles"))?;

        Ok(CurrentUser(AuthUser { user, roles }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(auth) = CurrentUser::from_request_parts(parts, state).await?;

        if auth.is_admin() {
            Ok(CurrentAdmin(auth))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

/// Authorization as role-set intersection: the caller must hold at least
/// one of the allowed roles.
pub(crate) fn require_role(auth: &AuthUser, allowed: &[RoleName]) -> Result<(), ApiError> {
    if allowed.iter().any(|role| auth.has_role(*role)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not enough permissions"))
    }
}

/// TEACHER callers must be the group's assigned teacher; admins and other
/// roles pass through.
pub(crate) fn require_group_teacher(
    auth: &AuthUser,
    group: &crate::repositories::groups::GroupWithTeacher,
) -> Result<(), ApiError> {
    if auth.is_admin() || !auth.has_role(RoleName::Teacher) {
        return Ok(());
    }

    match group.teacher_user_id.as_deref() {
        Some(teacher_user_id) if teacher_user_id == auth.user.id => Ok(()),
        _ => Err(ApiError::Forbidden("Only the assigned teacher may manage this group")),
    }
}
