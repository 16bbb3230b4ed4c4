use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::parse_authorization;
use crate::AppState;

/// JSON request body whose rejection uses the error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Signed-in user resolved from the `Authorization` header
///
/// Accepts both `Bearer <token>` and the bare token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::InvalidToken)?;

        let token = parse_authorization(header).ok_or(AppError::InvalidToken)?;
        let user = state.users.authenticate(token).await?;

        Ok(AuthUser(user))
    }
}

/// Signed-in moderator or administrator
///
/// Resolved from the request head, so rights are checked before the body
/// is read.
#[derive(Debug, Clone)]
pub struct ModeratorUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ModeratorUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        require_moderator(&user)?;
        Ok(ModeratorUser(user))
    }
}

/// Signed-in administrator
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        require_admin(&user)?;
        Ok(AdminUser(user))
    }
}

/// Moderators and administrators pass
pub fn require_moderator(user: &User) -> Result<()> {
    if user.moderator || user.administrator {
        Ok(())
    } else {
        tracing::warn!("User {} attempted a moderator action", user.id);
        Err(AppError::AdminOnly)
    }
}

pub fn require_admin(user: &User) -> Result<()> {
    if user.administrator {
        Ok(())
    } else {
        tracing::warn!("User {} attempted an administrator action", user.id);
        Err(AppError::AdminOnly)
    }
}
