//! Request bodies accepted by the HTTP API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::MedicalTestCategory;

/// Patient self-registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(
        length(min = 10, max = 50, message = "Email must contain from 10 to 50 characters"),
        email(message = "Email must follow the format user@example.com")
    )]
    pub email: String,

    #[validate(
        length(
            min = 10,
            max = 50,
            message = "Password's length must not be less than 10 or greater than 50 characters"
        ),
        custom = "crate::validation::password_policy"
    )]
    pub password: String,

    #[validate(
        length(
            min = 2,
            max = 50,
            message = "Name's length must not be less than 2 or greater than 50 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub name: String,

    #[validate(
        length(
            min = 2,
            max = 50,
            message = "Surname's length must not be less than 2 or greater than 50 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub surname: String,

    #[validate(custom = "crate::validation::past_date")]
    pub birth_date: NaiveDate,

    #[validate(
        length(
            min = 2,
            max = 50,
            message = "Street address's length must not be less than 2 or greater than 50 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub street_address: String,

    #[validate(
        length(
            min = 1,
            max = 20,
            message = "House's length must not be less than 1 or greater than 20 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub house: String,

    #[validate(
        length(
            min = 1,
            max = 20,
            message = "Apartment's length must not be less than 1 or greater than 20 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub apartment: String,

    #[validate(
        length(
            min = 1,
            max = 50,
            message = "City's length must not be less than 1 or greater than 50 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub city: String,

    #[validate(
        length(
            min = 2,
            max = 50,
            message = "State's length must not be less than 2 or greater than 50 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub state: String,

    #[validate(
        length(equal = 5, message = "ZIP's length must be 5 characters"),
        custom = "crate::validation::not_blank"
    )]
    pub zip: String,

    #[validate(
        length(equal = 11, message = "Phone number's length must be 11 characters"),
        custom = "crate::validation::not_blank"
    )]
    pub phone: String,

    #[validate(
        length(
            min = 2,
            max = 30,
            message = "Legal sex's length must not be less than 2 or greater than 30 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub sex: String,

    #[validate(
        length(
            min = 2,
            max = 50,
            message = "Citizenship's length must not be less than 2 or greater than 50 characters"
        ),
        custom = "crate::validation::not_blank"
    )]
    pub citizenship: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[validate(
        length(min = 10, max = 50, message = "Email must contain from 10 to 50 characters"),
        email(message = "Email must follow the format user@example.com")
    )]
    pub email: String,

    #[validate(length(
        min = 10,
        max = 50,
        message = "Password's length must not be less than 10 or greater than 50 characters"
    ))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(equal = 36, message = "Refresh token must contain UUID of 36 characters"))]
    pub refresh_token: String,
}

/// Password reset authorized by a one-time password
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(equal = 4, message = "One time password must contain 4 characters"))]
    pub otp: String,

    #[validate(
        length(
            min = 10,
            max = 50,
            message = "Password's length must not be less than 10 or greater than 50 characters"
        ),
        custom = "crate::validation::password_policy"
    )]
    pub new_password: String,

    #[validate(email(message = "Email must follow the format user@example.com"))]
    pub email: String,
}

/// Password change by a signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub current_password: String,

    #[validate(
        length(
            min = 10,
            max = 50,
            message = "Password's length must not be less than 10 or greater than 50 characters"
        ),
        custom = "crate::validation::password_policy"
    )]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicalTestAppointmentRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub test_name: String,

    #[validate(email(message = "Email must follow the format user@example.com"))]
    pub patient_email: String,

    #[validate(email(message = "Email must follow the format user@example.com"))]
    pub doctor_email: Option<String>,

    pub test_category: MedicalTestCategory,

    /// `yyyy-mm-dd`
    pub date_of_test: NaiveDate,
}
