//! HTTP handlers

pub mod appointment;
pub mod auth;
pub mod extract;
pub mod health;
pub mod otp;
pub mod password;

pub use appointment::*;
pub use auth::*;
pub use health::*;
pub use medical_test::*;
pub use otp::*;
pub use password::*;

use axum::Json;
use shared::StandardizedResponse;

/// Envelope type returned by every JSON handler
pub type ApiResponse<T> = Json<StandardizedResponse<T>>;

/// 200 envelope
pub fn ok<T>(data: T, message: &str) -> ApiResponse<T> {
    Json(StandardizedResponse::ok(data, 200, message))
}
