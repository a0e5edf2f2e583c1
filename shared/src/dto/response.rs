//! Response payloads returned inside the standardized envelope

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::MedicalTestCategory;

/// Tokens issued on sign-in and refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuthenticationResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Remaining refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

/// A consultation appointment as shown to a patient or doctor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: i64,
    pub doctors_id: i64,
    pub doctors_specialization: String,
    pub doctors_name: String,
    pub date_from: String,
    pub date_to: String,
    pub location: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalTestAppointmentResponse {
    pub id: i64,
    pub test_name: String,
    /// 0 when no doctor is assigned
    pub doctors_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctors_name: Option<String>,
    pub test_category: MedicalTestCategory,
    pub date_of_test: NaiveDate,
    pub has_pdf_result: bool,
}
