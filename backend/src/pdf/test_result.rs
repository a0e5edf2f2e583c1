//! Blood panel test result document

use chrono::NaiveDate;
use rand::Rng;
use shared::MedicalTestCategory;

use super::ReportPage;
use crate::error::{AppError, AppResult};

pub const TITLE: &str = "Medical Test Result";
const HEADERS: [&str; 4] = ["Test", "Result", "Units", "Reference Range"];
const INFO_TOP: f32 = 700.0;
const TABLE_TOP: f32 = 500.0;
const SIGNATURE_TOP: f32 = 200.0;

/// Everything printed about the test
#[derive(Debug, Clone)]
pub struct TestResultInput {
    pub category: MedicalTestCategory,
    pub test_name: String,
    pub patient_name: String,
    pub patient_birth_date: NaiveDate,
    pub date_of_test: NaiveDate,
    pub doctor_name: Option<String>,
}

enum Range {
    Decimal(f64, f64),
    Count(u32, u32),
}

struct Analyte {
    name: &'static str,
    range: Range,
    units: &'static str,
    reference: &'static str,
}

const fn decimal(
    name: &'static str,
    min: f64,
    max: f64,
    units: &'static str,
    reference: &'static str,
) -> Analyte {
    Analyte {
        name,
        range: Range::Decimal(min, max),
        units,
        reference,
    }
}

const fn count(
    name: &'static str,
    min: u32,
    max: u32,
    units: &'static str,
    reference: &'static str,
) -> Analyte {
    Analyte {
        name,
        range: Range::Count(min, max),
        units,
        reference,
    }
}

const PANEL: [Analyte; 10] = [
    decimal("Hemoglobin", 13.0, 17.0, "g/dL", "13.0 - 17.0"),
    count("WBC", 4_500, 11_000, "cells/mcL", "4,500 - 11,000"),
    count("Platelets", 150_000, 450_000, "/mcL", "150,000 - 450,000"),
    decimal("Blood Glucose", 70.0, 99.0, "mg/dL", "70 - 99"),
    decimal("RBC", 4.2, 6.0, "mil/mcL", "4.2 - 6.0"),
    decimal("Cholesterol", 150.0, 300.0, "mg/dL", "< 200"),
    decimal("Triglycerides", 50.0, 200.0, "mg/dL", "< 150"),
    decimal("LDL", 70.0, 180.0, "mg/dL", "< 100"),
    decimal("HDL", 40.0, 90.0, "mg/dL", "40 - 60"),
    decimal("Uric Acid", 3.0, 7.5, "mg/dL", "3.0 - 7.5"),
];

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// One row per analyte with a random result inside its range
pub fn panel_rows<R: Rng>(rng: &mut R) -> Vec<[String; 4]> {
    PANEL
        .iter()
        .map(|analyte| {
            let result = match analyte.range {
                Range::Decimal(min, max) => format!("{:.1}", rng.random_range(min..max)),
                Range::Count(min, max) => group_thousands(rng.random_range(min..=max)),
            };
            [
                analyte.name.to_string(),
                result,
                analyte.units.to_string(),
                analyte.reference.to_string(),
            ]
        })
        .collect()
}

pub fn info_lines(input: &TestResultInput, doctor_name: &str) -> Vec<String> {
    vec![
        format!("Test Type: {}", input.category),
        format!("Test Name: {}", input.test_name),
        format!("Patient Name: {}", input.patient_name),
        format!("Date of Birth: {}", input.patient_birth_date),
        format!("Test Date: {}", input.date_of_test),
        format!("Doctor name: {}", doctor_name),
    ]
}

/// Render the result PDF; tests without a doctor cannot be signed
pub fn generate_test_result<R: Rng>(
    input: &TestResultInput,
    rng: &mut R,
) -> AppResult<Vec<u8>> {
    let doctor_name = input.doctor_name.as_deref().ok_or_else(|| {
        AppError::InvalidMedicalTestData("Test appointment has no doctor assigned".to_string())
    })?;

    let page = ReportPage::new(TITLE)?;
    page.header(TITLE);
    page.info_lines(&info_lines(input, doctor_name), INFO_TOP);
    page.table(&HEADERS, &panel_rows(rng), TABLE_TOP);
    page.signature(SIGNATURE_TOP);
    page.finish()
}
