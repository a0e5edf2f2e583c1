//! Authentication middleware
//!
//! Validates the bearer JWT of protected routes and exposes the signed-in user

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::{UserAccount, UserService};
use crate::AppState;

/// Token of an `Authorization: Bearer <jwt>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::invalid_token("Authorization", "Missing or invalid Authorization header")
        })
}

/// Authentication middleware that validates JWT tokens
///
/// The token must decode, must not be blacklisted by a logout, and its subject
/// must load an existing user. That user is put into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.to_string();

    if state.blacklist.is_blacklisted(&token) {
        return Err(AppError::invalid_token("JWT", "Token has been revoked"));
    }

    let email = state.jwt.extract_username(&token)?;
    let user = UserService::new(state.db.clone())
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::invalid_token("JWT", "Token subject does not exist"))?;

    if !state.jwt.is_token_valid(&token, &user) {
        return Err(AppError::invalid_token("JWT", "Token is not valid for this user"));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserAccount);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserAccount>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::invalid_token("Authorization", "Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_foreign_scheme_rejected() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers("Bearer ")).is_err());
    }
}
