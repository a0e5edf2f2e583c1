//! Consultation appointment listings

use chrono::NaiveDateTime;
use shared::{AppointmentRequestType, AppointmentResponse, AppointmentStatus};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::now;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Consultation joined with its doctor, first specialization and location
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConsultationRow {
    pub id: i64,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub doctor_surname: String,
    pub specialization: Option<String>,
    pub date_from: NaiveDateTime,
    pub date_to: NaiveDateTime,
    pub hospital_name: Option<String>,
    pub house: Option<String>,
    pub street_address: Option<String>,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub appointment_status: String,
}

impl ConsultationRow {
    /// "hospital, house street", or empty without a location
    pub fn location(&self) -> String {
        match (&self.hospital_name, &self.house, &self.street_address) {
            (Some(hospital), Some(house), Some(street)) => {
                format!("{}, {} {}", hospital, house, street)
            }
            _ => String::new(),
        }
    }

    pub fn into_response(self) -> AppResult<AppointmentResponse> {
        let status = self
            .appointment_status
            .parse::<AppointmentStatus>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(AppointmentResponse {
            location: self.location(),
            id: self.id,
            doctors_id: self.doctor_id,
            doctors_specialization: self.specialization.unwrap_or_default(),
            doctors_name: format!("{} {}", self.doctor_name, self.doctor_surname),
            date_from: self.date_from.format(DATE_TIME_FORMAT).to_string(),
            date_to: self.date_to.format(DATE_TIME_FORMAT).to_string(),
            status: status.label().to_string(),
            kind: self.kind,
        })
    }
}

/// Reject negative amounts; `None` means `default`
pub fn resolve_amount(amount: Option<i32>, default: i32) -> Result<usize, i32> {
    let amount = amount.unwrap_or(default);
    usize::try_from(amount).map_err(|_| amount)
}

/// First `amount` items, or all of them when `amount` is 0
pub fn take_amount<T>(items: impl Iterator<Item = T>, amount: usize) -> Vec<T> {
    if amount == 0 {
        items.collect()
    } else {
        items.take(amount).collect()
    }
}

/// Filter by side of `now`, order by start ascending, cut to `amount`
pub fn select_appointments(
    mut rows: Vec<ConsultationRow>,
    kind: AppointmentRequestType,
    amount: usize,
    now: NaiveDateTime,
) -> Vec<ConsultationRow> {
    rows.sort_by_key(|row| row.date_from);
    take_amount(
        rows.into_iter().filter(|row| kind.matches(&row.date_from, &now)),
        amount,
    )
}

/// Appointment service
#[derive(Clone)]
pub struct AppointmentService {
    db: PgPool,
}

impl AppointmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Appointments where the person is the patient or the doctor
    pub async fn get_appointments(
        &self,
        person_id: Option<i64>,
        amount: Option<i32>,
        kind: AppointmentRequestType,
    ) -> AppResult<Vec<AppointmentResponse>> {
        let amount = resolve_amount(amount, 0).map_err(|_| {
            AppError::NegativeAmount(
                "If amount param presented then it must be positive or zero".to_string(),
            )
        })?;

        let Some(person_id) = person_id else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ConsultationRow>(
            r#"
            SELECT c.id, c.doctor_id, p.name AS doctor_name, p.surname AS doctor_surname,
                   (SELECT s.specialization
                    FROM doctors_specializations_bridge b
                    JOIN specializations s ON s.id = b.specializations_id
                    WHERE b.doctor_id = c.doctor_id
                    ORDER BY s.id
                    LIMIT 1) AS specialization,
                   c.date_from, c.date_to,
                   l.hospital_name, l.house, l.street_address,
                   c.type, c.appointment_status
            FROM consultation_appointments c
            JOIN persons p ON p.id = c.doctor_id
            LEFT JOIN locations l ON l.id = c.location_id
            WHERE c.patient_id = $1 OR c.doctor_id = $1
            ORDER BY c.date_from ASC
            "#,
        )
        .bind(person_id)
        .fetch_all(&self.db)
        .await?;

        select_appointments(rows, kind, amount, now())
            .into_iter()
            .map(ConsultationRow::into_response)
            .collect()
    }
}
