//! Password handlers

use axum::extract::State;
use shared::{ChangePasswordRequest, ResetPasswordRequest};

use super::extract::ValidatedJson;
use super::{ok, ApiResponse};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<ApiResponse<String>> {
    state.password_service().reset_password(&body).await?;
    Ok(ok("Password has been reset".to_string(), "New password has been set"))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<ApiResponse<String>> {
    state.password_service().change_password(&user, &body).await?;
    Ok(ok("Your password is changed".to_string(), "Operation successful"))
}
