use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::auth::repo;
use crate::auth::repo_types::User;
use crate::auth::token::hash_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Pull the token out of an "Authorization: Bearer <token>" header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

/// Extracts the bearer token, resolves it against auth_tokens and returns
/// the acting user. Identity is always explicit; there is no ambient
/// current-user state anywhere else.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            ApiError::Unauthenticated("Missing or invalid Authorization header".into())
        })?;

        let user = repo::find_user_by_token(&state.db, &hash_token(token.trim()))
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("Invalid or expired token".into()))?;

        Ok(AuthUser(user))
    }
}
