//! Validation utilities for the Medfast patient portal
//!
//! Custom rules plugged into `validator` derives on the request DTOs, plus helpers
//! for turning `ValidationErrors` into a flat field -> message map.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use validator::{ValidationError, ValidationErrors};

/// Characters accepted as the "special character" of the password policy
pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

pub const PASSWORD_POLICY_MESSAGE: &str = "Password must contain at least one digit, one special \
character, one lowercase, and one uppercase letter, and no whitespace";

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

// ============================================================================
// Field Rules
// ============================================================================

/// Reject empty and whitespace-only strings
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("not_blank", "must not be blank"));
    }
    Ok(())
}

/// Digit, special character, lower and upper case letter, no whitespace
pub fn password_policy(password: &str) -> Result<(), ValidationError> {
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c));
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_whitespace = password.chars().any(char::is_whitespace);

    if has_digit && has_special && has_lower && has_upper && !has_whitespace {
        Ok(())
    } else {
        Err(error("password_policy", PASSWORD_POLICY_MESSAGE))
    }
}

/// Birth dates must be strictly before today
pub fn past_date(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date < Local::now().date_naive() {
        Ok(())
    } else {
        Err(error("past", "Birth date must be in the past"))
    }
}

// ============================================================================
// Error Reporting
// ============================================================================

/// Convert a Rust field name to the camelCase name used on the wire
pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// First message reported for every invalid field, keyed by wire name
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", e.code));
                (to_camel_case(field), message)
            })
        })
        .collect()
}
