//! Error handling for the Medfast backend
//!
//! Every failure is rendered as a `StandardizedResponse` envelope carrying the
//! HTTP status, a short message, the error code and the detailed error text.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::{validation::field_messages, StandardizedResponse};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Request errors
    #[error("{0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid value provided for parameter '{name}'{}", expected_suffix(.expected))]
    InvalidParameter {
        name: String,
        /// Accepted values, when the parameter is an enum
        expected: Option<String>,
    },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Failed with: {0}")]
    NegativeAmount(String),

    #[error("Invalid test data: {0}")]
    InvalidMedicalTestData(String),

    // Authentication errors
    #[error("Bad credentials")]
    BadCredentials,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Error for [{criteria}]: {message}")]
    InvalidToken { criteria: String, message: String },

    #[error("The token sent has already expired [{token}]: {message}")]
    TokenExpired { token: String, message: String },

    #[error("Failed for [{criteria}]: {message}")]
    TokenNotFound { criteria: String, message: String },

    #[error("Invalid verification code")]
    InvalidVerificationCode,

    #[error("No matching user found. If you don't have an account, please register.")]
    UserNotFound(String),

    #[error("Failed for [{0}]: User with this email already exists")]
    UserAlreadyExists(String),

    #[error("User with credential [{0}]: User is already verified")]
    UserAlreadyVerified(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    // Password errors
    #[error("Incorrect current password. Please try again")]
    InvalidCurrentPassword,

    #[error("Failed with The password has already been used before")]
    PasswordHistory,

    #[error("Current password and new password should be different")]
    PasswordRepetition,

    // External service errors
    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error("Failed to generate pdf: {0}")]
    Pdf(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine readable code, sent as `errorClass`
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AppError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AppError::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            AppError::InvalidMedicalTestData(_) => "INVALID_MEDICAL_TEST_DATA",
            AppError::BadCredentials => "BAD_CREDENTIALS",
            AppError::UserDisabled => "USER_DISABLED",
            AppError::InvalidToken { .. } => "INVALID_TOKEN",
            AppError::TokenExpired { .. } => "TOKEN_EXPIRED",
            AppError::TokenNotFound { .. } => "TOKEN_NOT_FOUND",
            AppError::InvalidVerificationCode => "INVALID_VERIFICATION_CODE",
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            AppError::UserAlreadyVerified(_) => "USER_ALREADY_VERIFIED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidCurrentPassword => "INVALID_CURRENT_PASSWORD",
            AppError::PasswordHistory => "PASSWORD_HISTORY",
            AppError::PasswordRepetition => "PASSWORD_REPETITION",
            AppError::Mail(_) => "MAIL_ERROR",
            AppError::Pdf(_) => "PDF_GENERATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidParameter { .. }
            | AppError::MalformedRequest(_)
            | AppError::NegativeAmount(_)
            | AppError::InvalidMedicalTestData(_)
            | AppError::TokenExpired { .. }
            | AppError::InvalidVerificationCode => StatusCode::BAD_REQUEST,
            AppError::BadCredentials | AppError::UserDisabled | AppError::InvalidToken { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound(_) | AppError::TokenNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::UserAlreadyExists(_)
            | AppError::UserAlreadyVerified(_)
            | AppError::InvalidCurrentPassword
            | AppError::PasswordHistory
            | AppError::PasswordRepetition => StatusCode::CONFLICT,
            AppError::Mail(_)
            | AppError::Pdf(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short summary, sent as `message`
    pub fn summary(&self) -> String {
        match self {
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::InvalidParameter {
                name,
                expected: Some(_),
            } => format!("Invalid '{}' parameter value", name),
            AppError::InvalidParameter { expected: None, .. } => "Invalid parameter".to_string(),
            AppError::MalformedRequest(_) => "Malformed request".to_string(),
            AppError::NegativeAmount(_) | AppError::InvalidMedicalTestData(_) => {
                "Invalid request".to_string()
            }
            AppError::TokenExpired { .. } => "Token expired".to_string(),
            AppError::InvalidVerificationCode => "Invalid verification code".to_string(),
            AppError::BadCredentials | AppError::UserDisabled => {
                "Provided credentials are bad or user is disabled".to_string()
            }
            AppError::InvalidToken { .. } => "Unauthorized".to_string(),
            AppError::Forbidden(_) => "Access denied".to_string(),
            AppError::UserNotFound(_) => "User not found".to_string(),
            AppError::TokenNotFound { .. } => "Token not found".to_string(),
            AppError::UserAlreadyExists(_) | AppError::UserAlreadyVerified(_) => {
                "Conflict".to_string()
            }
            AppError::InvalidCurrentPassword
            | AppError::PasswordHistory
            | AppError::PasswordRepetition => "Password change failed".to_string(),
            AppError::Mail(_)
            | AppError::Pdf(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => "Internal server error".to_string(),
        }
    }

    /// Detailed text, sent as `errorMessage`; internals are not leaked
    fn detail(&self) -> String {
        match self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalError(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// A query value that does not parse into the parameter's type
    pub fn invalid_parameter(name: impl Into<String>) -> Self {
        AppError::InvalidParameter {
            name: name.into(),
            expected: None,
        }
    }

    pub fn invalid_token(criteria: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidToken {
            criteria: criteria.into(),
            message: message.into(),
        }
    }

    pub fn token_not_found(criteria: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::TokenNotFound {
            criteria: criteria.into(),
            message: message.into(),
        }
    }

    pub fn token_expired(token: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::TokenExpired {
            token: token.into(),
            message: message.into(),
        }
    }
}

/// Submitted enum values that name no variant
impl From<shared::UnknownVariant> for AppError {
    fn from(e: shared::UnknownVariant) -> Self {
        AppError::InvalidParameter {
            name: e.field().to_string(),
            expected: Some(e.expected().to_string()),
        }
    }
}

fn expected_suffix(expected: &Option<String>) -> String {
    expected
        .as_deref()
        .map(|values| format!(". Expected one of: {}", values))
        .unwrap_or_default()
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Password hashing failed: {}", e))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::invalid_token("JWT", "Token has expired"),
            ErrorKind::InvalidSignature => AppError::invalid_token("JWT", "Invalid signature"),
            _ => AppError::invalid_token("JWT", format!("Malformed token: {}", e)),
        }
    }
}

/// Error envelope type
pub type ErrorResponse = StandardizedResponse<BTreeMap<String, String>>;

impl AppError {
    pub fn to_envelope(&self) -> ErrorResponse {
        let status = self.status().as_u16();
        let code = Some(self.code().to_string());
        let detail = Some(self.detail());

        match self {
            AppError::Validation(errors) => StandardizedResponse::error_with_data(
                field_messages(errors),
                status,
                self.summary(),
                code,
                detail,
            ),
            _ => StandardizedResponse::error(status, self.summary(), code, detail),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!(code = self.code(), "Error: {:?}", self);
        } else {
            tracing::debug!(code = self.code(), "Request rejected: {}", self);
        }

        (status, Json(self.to_envelope())).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
