//! Business logic services for the Medfast patient portal

pub mod appointment;
pub mod auth;
pub mod email;
pub mod jwt;
pub mod medical_test;
pub mod otp;
pub mod password;
pub mod refresh_token;
pub mod user;
pub mod verification;

pub use appointment::AppointmentService;
pub use auth::AuthService;
pub use email::{EmailService, Mailer};
pub use jwt::{JwtService, TokenBlacklist};
pub use medical_test::MedicalTestService;
pub use otp::OtpService;
pub use password::PasswordService;
pub use refresh_token::RefreshTokenService;
pub use user::{UserAccount, UserService};
pub use verification::VerificationService;

use chrono::{Duration, Local, NaiveDateTime};

/// Wall clock used for audit columns and token ages
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A token created at `created` has outlived `timeout_secs` at `now`
pub fn is_expired(created: NaiveDateTime, now: NaiveDateTime, timeout_secs: i64) -> bool {
    now - created > Duration::seconds(timeout_secs)
}

/// Seconds left before expiry, never negative
pub fn remaining_lifetime(created: NaiveDateTime, now: NaiveDateTime, timeout_secs: i64) -> i64 {
    (timeout_secs - (now - created).num_seconds()).max(0)
}
