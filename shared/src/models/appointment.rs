//! Consultation appointment models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::UnknownVariant;

/// Lifecycle status of a consultation appointment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    ScheduledConfirmed,
    CancelledPatient,
    CancelledClinic,
    InConsultation,
    Completed,
    Missed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 7] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::ScheduledConfirmed,
        AppointmentStatus::CancelledPatient,
        AppointmentStatus::CancelledClinic,
        AppointmentStatus::InConsultation,
        AppointmentStatus::Completed,
        AppointmentStatus::Missed,
    ];

    /// Name as stored in the `appointment_status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::ScheduledConfirmed => "SCHEDULED_CONFIRMED",
            AppointmentStatus::CancelledPatient => "CANCELLED_PATIENT",
            AppointmentStatus::CancelledClinic => "CANCELLED_CLINIC",
            AppointmentStatus::InConsultation => "IN_CONSULTATION",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Missed => "MISSED",
        }
    }

    /// Human readable label shown to patients
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::ScheduledConfirmed => "Scheduled (Confirmed)",
            AppointmentStatus::CancelledPatient => "Cancelled by the patient",
            AppointmentStatus::CancelledClinic => "Cancelled by the clinic",
            AppointmentStatus::InConsultation => "In-Consultation",
            AppointmentStatus::Completed => "Completed appointment",
            AppointmentStatus::Missed => "Missed appointment",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                UnknownVariant::new(
                    "appointment_status",
                    s,
                    &AppointmentStatus::ALL.map(|st| st.as_str()),
                )
            })
    }
}

/// Which side of "now" a listing should return
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentRequestType {
    Past,
    Upcoming,
}

impl AppointmentRequestType {
    pub const ALL: [AppointmentRequestType; 2] =
        [AppointmentRequestType::Past, AppointmentRequestType::Upcoming];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentRequestType::Past => "PAST",
            AppointmentRequestType::Upcoming => "UPCOMING",
        }
    }

    /// Strict comparison: a moment equal to `now` is neither past nor upcoming
    pub fn matches<T: PartialOrd>(&self, moment: &T, now: &T) -> bool {
        match self {
            AppointmentRequestType::Past => moment < now,
            AppointmentRequestType::Upcoming => moment > now,
        }
    }
}

impl FromStr for AppointmentRequestType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentRequestType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                UnknownVariant::new("type", s, &AppointmentRequestType::ALL.map(|k| k.as_str()))
            })
    }
}
