//! Authentication handlers

use axum::extract::State;
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use serde::Deserialize;
use shared::{JwtAuthenticationResponse, RefreshTokenRequest, SignInRequest, SignUpRequest};
use validator::Validate;

use super::extract::{ValidatedJson, ValidatedQuery};
use super::{ok, ApiResponse};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct EmailQuery {
    #[validate(email(message = "Email must follow the format user@example.com"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyQuery {
    #[validate(email(message = "Email must follow the format user@example.com"))]
    pub email: String,
    pub code: String,
}

/// Sign up endpoint handler
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignUpRequest>,
) -> AppResult<ApiResponse<String>> {
    let message = state.auth_service().sign_up(&body).await?;
    Ok(ok(message.to_string(), "Sign up successful"))
}

/// Sign in endpoint handler
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignInRequest>,
) -> AppResult<ApiResponse<JwtAuthenticationResponse>> {
    let tokens = state.auth_service().sign_in(&body).await?;
    Ok(ok(tokens, "Sign in successful"))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<ApiResponse<JwtAuthenticationResponse>> {
    let tokens = state.auth_service().refresh(&body).await?;
    Ok(ok(tokens, "Refreshing token successful"))
}

/// E-mail verification link target
pub async fn verify(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<VerifyQuery>,
) -> AppResult<ApiResponse<String>> {
    state.auth_service().verify(&query.email, &query.code).await?;
    Ok(ok("Your account is verified".to_string(), "Operation successful"))
}

/// Resend the verification link
pub async fn reverify(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<EmailQuery>,
) -> AppResult<ApiResponse<String>> {
    state
        .auth_service()
        .send_verification_email(&query.email)
        .await?;
    Ok(ok(
        "Another email has been sent to your email".to_string(),
        "Operation successful",
    ))
}

/// Logout endpoint handler
pub async fn logout(
    State(state): State<AppState>,
    header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> AppResult<ApiResponse<String>> {
    let TypedHeader(Authorization(bearer)) = header.map_err(|e| {
        AppError::invalid_token("Authorization", format!("Invalid Authorization header: {}", e))
    })?;

    state.auth_service().logout(bearer.token()).await?;
    Ok(ok("Logged out".to_string(), "Logout successful"))
}
