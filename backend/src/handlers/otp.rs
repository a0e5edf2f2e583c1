//! One-time password handlers

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use super::auth::EmailQuery;
use super::extract::ValidatedQuery;
use super::{ok, ApiResponse};
use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct OtpVerifyQuery {
    #[validate(email(message = "Email must follow the format user@example.com"))]
    pub email: String,
    #[validate(length(equal = 4, message = "Token must be 4 characters long"))]
    pub token: String,
}

/// Mail a reset password code
pub async fn send_otp(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<EmailQuery>,
) -> AppResult<ApiResponse<String>> {
    state
        .otp_service()
        .send_reset_password_email(&query.email)
        .await?;
    Ok(ok(
        "Reset password email has been sent".to_string(),
        "Email sent successfully",
    ))
}

/// Check a reset password code without consuming it
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<OtpVerifyQuery>,
) -> AppResult<ApiResponse<String>> {
    state.otp_service().verify(&query.email, &query.token).await?;
    Ok(ok("Token is valid".to_string(), "Token has been verified"))
}
