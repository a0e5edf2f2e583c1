//! Consultation appointment handlers

use axum::extract::State;
use serde::Deserialize;
use shared::{AppointmentRequestType, AppointmentResponse};
use validator::Validate;

use super::extract::{parse_param, ValidatedQuery};
use super::{ok, ApiResponse};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::AppointmentService;
use crate::AppState;

/// `?amount=&type=` of the listing endpoints
#[derive(Debug, Deserialize, Validate)]
pub struct ListQuery {
    pub amount: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ListQuery {
    pub fn amount(&self) -> AppResult<Option<i32>> {
        self.amount
            .as_deref()
            .map(|raw| parse_param("amount", raw))
            .transpose()
    }

    pub fn request_type(&self) -> AppResult<AppointmentRequestType> {
        Ok(self.kind.parse()?)
    }
}

pub async fn get_appointments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
) -> AppResult<ApiResponse<Vec<AppointmentResponse>>> {
    let appointments = AppointmentService::new(state.db.clone())
        .get_appointments(Some(user.person_id), query.amount()?, query.request_type()?)
        .await?;

    Ok(ok(appointments, "Operation successful"))
}
