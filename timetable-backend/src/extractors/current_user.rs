// src/extractors/current_user.rs
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// 呼び出し元ユーザーを識別するヘッダー
pub const USER_ID_HEADER: &str = "x-user-id";

/// 認証済みユーザー
///
/// 認証そのものは前段のゲートウェイが行い、確定したユーザーIDを
/// `X-User-Id` ヘッダーで渡してくる前提。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
}

impl CurrentUser {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header".to_string()))?;

        let user_id = Uuid::parse_str(raw.trim()).map_err(|_| {
            AppError::Unauthorized(format!("Invalid user id in X-User-Id header: '{}'", raw))
        })?;

        Ok(CurrentUser { user_id })
    }
}
