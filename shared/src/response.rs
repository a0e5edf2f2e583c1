//! Standardized response envelope shared by every endpoint

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Envelope wrapping both successful payloads and errors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizedResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub status: u16,
    pub message: String,
    pub timestamp: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl<T> StandardizedResponse<T> {
    pub fn ok(data: T, status: u16, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            status,
            message: message.into(),
            timestamp: Local::now().naive_local(),
            error_class: None,
            error_message: None,
        }
    }

    pub fn error(
        status: u16,
        message: impl Into<String>,
        error_class: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        Self {
            data: None,
            status,
            message: message.into(),
            timestamp: Local::now().naive_local(),
            error_class,
            error_message,
        }
    }

    pub fn error_with_data(
        data: T,
        status: u16,
        message: impl Into<String>,
        error_class: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        Self {
            data: Some(data),
            ..Self::error(status, message, error_class, error_message)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_class.is_none() && self.error_message.is_none() && self.status < 400
    }
}
