//! Medical test appointments and their PDF results

use chrono::{Local, NaiveDate};
use shared::{
    AppointmentRequestType, CreateMedicalTestAppointmentRequest, MedicalTestAppointmentResponse,
    MedicalTestCategory, Role,
};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::pdf::{generate_test_result, TestResultInput};
use crate::services::{
    appointment::{resolve_amount, take_amount},
    now,
    user::{UserAccount, UserService},
};

const NOT_FOUND: &str = "Test appointment not found";

/// Test appointment joined with patient and doctor names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicalTestRow {
    pub id: i64,
    pub test_name: String,
    pub test_category: String,
    pub date_of_test: NaiveDate,
    pub has_pdf: bool,
    pub patient_id: i64,
    pub patient_name: String,
    pub patient_surname: String,
    pub patient_birth_date: NaiveDate,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub doctor_surname: Option<String>,
}

impl MedicalTestRow {
    fn category(&self) -> AppResult<MedicalTestCategory> {
        self.test_category
            .parse()
            .map_err(|e: shared::UnknownVariant| AppError::Internal(e.to_string()))
    }

    fn doctor_full_name(&self) -> Option<String> {
        match (&self.doctor_name, &self.doctor_surname) {
            (Some(name), Some(surname)) => Some(format!("{} {}", name, surname)),
            _ => None,
        }
    }

    pub fn into_response(self) -> AppResult<MedicalTestAppointmentResponse> {
        Ok(MedicalTestAppointmentResponse {
            test_category: self.category()?,
            doctors_name: self.doctor_full_name(),
            doctors_id: self.doctor_id.unwrap_or(0),
            id: self.id,
            test_name: self.test_name,
            date_of_test: self.date_of_test,
            has_pdf_result: self.has_pdf,
        })
    }

    pub fn result_input(&self) -> AppResult<TestResultInput> {
        Ok(TestResultInput {
            category: self.category()?,
            test_name: self.test_name.clone(),
            patient_name: format!("{} {}", self.patient_name, self.patient_surname),
            patient_birth_date: self.patient_birth_date,
            date_of_test: self.date_of_test,
            doctor_name: self.doctor_full_name(),
        })
    }

    /// `Name_Surname_yyyy-mm-dd.pdf`
    pub fn pdf_name(&self) -> String {
        format!(
            "{}_{}_{}.pdf",
            self.patient_name, self.patient_surname, self.date_of_test
        )
    }
}

/// Tests already taken need a doctor
pub fn check_new_test(
    request: &CreateMedicalTestAppointmentRequest,
    today: NaiveDate,
) -> AppResult<()> {
    if request.doctor_email.is_none() && request.date_of_test < today {
        return Err(AppError::InvalidMedicalTestData(
            "Already taken tests should have a doctor assigned to them".to_string(),
        ));
    }
    Ok(())
}

/// A result can be generated once, for a test that has taken place
pub fn check_generation(row: &MedicalTestRow, today: NaiveDate) -> AppResult<()> {
    if row.date_of_test > today {
        return Err(AppError::InvalidMedicalTestData(
            "Test appointment is not yet taken".to_string(),
        ));
    }
    if row.has_pdf {
        return Err(AppError::InvalidMedicalTestData(
            "Test result already exists".to_string(),
        ));
    }
    Ok(())
}

/// Patients may only read their own results
pub fn check_result_access(user: &UserAccount, row: &MedicalTestRow) -> AppResult<()> {
    if user.role == Role::Patient && row.patient_id != user.id {
        return Err(AppError::Forbidden(
            "Only admin, doctor and patient who owns the test can access test results".to_string(),
        ));
    }
    Ok(())
}

/// Tests of one side of `today`, newest first, cut to `amount`
pub fn select_tests(
    mut rows: Vec<MedicalTestRow>,
    kind: AppointmentRequestType,
    amount: usize,
    today: NaiveDate,
) -> Vec<MedicalTestRow> {
    rows.sort_by(|a, b| b.date_of_test.cmp(&a.date_of_test));
    take_amount(
        rows.into_iter()
            .filter(|row| kind.matches(&row.date_of_test, &today)),
        amount,
    )
}

const SELECT_TEST: &str = r#"
    SELECT t.id, t.test_name, t.test_category, t.date_of_test,
           t.pdf_result IS NOT NULL AS has_pdf,
           t.patient_id, pp.name AS patient_name, pp.surname AS patient_surname,
           pp.birth_date AS patient_birth_date,
           t.doctor_id, dp.name AS doctor_name, dp.surname AS doctor_surname
    FROM test_appointments t
    JOIN users pu ON pu.id = t.patient_id
    JOIN persons pp ON pp.id = pu.person_id
    LEFT JOIN users du ON du.id = t.doctor_id
    LEFT JOIN persons dp ON dp.id = du.person_id
"#;

/// Medical test service
#[derive(Clone)]
pub struct MedicalTestService {
    db: PgPool,
    users: UserService,
}

impl MedicalTestService {
    pub fn new(db: PgPool) -> Self {
        Self {
            users: UserService::new(db.clone()),
            db,
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub async fn find(&self, id: i64) -> AppResult<Option<MedicalTestRow>> {
        let row = sqlx::query_as::<_, MedicalTestRow>(&format!("{SELECT_TEST} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row)
    }

    async fn get(&self, id: i64) -> AppResult<MedicalTestRow> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::InvalidMedicalTestData(NOT_FOUND.to_string()))
    }

    /// Book a test; only doctors and admins may do so
    pub async fn create(
        &self,
        actor: &UserAccount,
        request: &CreateMedicalTestAppointmentRequest,
    ) -> AppResult<MedicalTestAppointmentResponse> {
        if !actor.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only doctors and admins can create test appointments".to_string(),
            ));
        }
        check_new_test(request, Self::today())?;

        let doctor = match &request.doctor_email {
            Some(email) => Some(self.users.get_by_email_and_role(email, Role::Doctor).await?),
            None => None,
        };
        let patient = self
            .users
            .get_by_email_and_role(&request.patient_email, Role::Patient)
            .await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO test_appointments (test_name, patient_id, doctor_id, test_category,
                                           date_of_test, pdf_result, created_by, created_date,
                                           last_modified_by, last_modified_date)
            VALUES ($1, $2, $3, $4, $5, NULL, $6, $7, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&request.test_name)
        .bind(patient.id)
        .bind(doctor.as_ref().map(|d| d.id))
        .bind(request.test_category.as_str())
        .bind(request.date_of_test)
        .bind(&actor.email)
        .bind(now())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(test_id = id, patient_id = patient.id, "Test appointment created");

        Ok(MedicalTestAppointmentResponse {
            id,
            test_name: request.test_name.clone(),
            doctors_id: doctor.as_ref().map(|d| d.id).unwrap_or(0),
            doctors_name: doctor.as_ref().map(UserAccount::full_name),
            test_category: request.test_category,
            date_of_test: request.date_of_test,
            has_pdf_result: false,
        })
    }

    /// The user's tests as a patient
    pub async fn list(
        &self,
        user: &UserAccount,
        amount: Option<i32>,
        kind: AppointmentRequestType,
    ) -> AppResult<Vec<MedicalTestAppointmentResponse>> {
        let amount = resolve_amount(amount, 2).map_err(|_| {
            AppError::InvalidMedicalTestData(
                "If amount param presented then it must be positive or zero".to_string(),
            )
        })?;

        let rows = sqlx::query_as::<_, MedicalTestRow>(&format!(
            "{SELECT_TEST} WHERE t.patient_id = $1 ORDER BY t.date_of_test DESC"
        ))
        .bind(user.id)
        .fetch_all(&self.db)
        .await?;

        select_tests(rows, kind, amount, Self::today())
            .into_iter()
            .map(MedicalTestRow::into_response)
            .collect()
    }

    /// Admin-triggered result generation
    pub async fn generate_result(&self, actor: &UserAccount, id: i64) -> AppResult<()> {
        if actor.role != Role::Admin {
            return Err(AppError::Forbidden(
                "Only admins can generate test results".to_string(),
            ));
        }
        self.generate_result_for(id, &actor.email).await
    }

    /// Generate and store the result PDF without a caller role check
    pub async fn generate_result_for(&self, id: i64, actor: &str) -> AppResult<()> {
        let row = self.get(id).await?;
        check_generation(&row, Self::today())?;

        let input = row.result_input()?;
        let pdf = generate_test_result(&input, &mut rand::rng())?;

        sqlx::query(
            r#"
            UPDATE test_appointments
            SET pdf_result = $2, last_modified_by = $3, last_modified_date = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&pdf)
        .bind(actor)
        .bind(now())
        .execute(&self.db)
        .await?;

        tracing::info!(test_id = id, bytes = pdf.len(), "Test result generated");
        Ok(())
    }

    /// PDF bytes and download name of a test result
    pub async fn get_result(&self, user: &UserAccount, id: i64) -> AppResult<(String, Vec<u8>)> {
        let row = self.get(id).await?;
        check_result_access(user, &row)?;

        let pdf = sqlx::query_scalar::<_, Option<Vec<u8>>>(
            "SELECT pdf_result FROM test_appointments WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?
        .ok_or_else(|| AppError::InvalidMedicalTestData("Test result not found".to_string()))?;

        Ok((row.pdf_name(), pdf))
    }

    pub async fn find_ids_by_date(&self, date: NaiveDate) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM test_appointments WHERE date_of_test = $1 ORDER BY id",
        )
        .bind(date)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(id: i64, day: u32) -> MedicalTestRow {
        MedicalTestRow {
            id,
            test_name: "Complete blood count".to_string(),
            test_category: "BLOOD".to_string(),
            date_of_test: date(2024, 7, day),
            has_pdf: false,
            patient_id: 5,
            patient_name: "John".to_string(),
            patient_surname: "Doe".to_string(),
            patient_birth_date: date(1990, 5, 17),
            doctor_id: Some(9),
            doctor_name: Some("Gregory".to_string()),
            doctor_surname: Some("House".to_string()),
        }
    }

    fn user(id: i64, role: Role) -> UserAccount {
        UserAccount {
            id,
            email: "user@medfast.test".to_string(),
            password_hash: String::new(),
            enabled: true,
            role,
            person_id: id,
            name: "Any".to_string(),
            surname: "One".to_string(),
            birth_date: date(1980, 1, 1),
        }
    }

    fn request(doctor: Option<&str>, day: u32) -> CreateMedicalTestAppointmentRequest {
        CreateMedicalTestAppointmentRequest {
            test_name: "MRI of the knee".to_string(),
            patient_email: "johndoe@gmail.com".to_string(),
            doctor_email: doctor.map(str::to_string),
            test_category: MedicalTestCategory::Mri,
            date_of_test: date(2024, 7, day),
        }
    }

    #[test]
    fn test_past_test_without_doctor_rejected() {
        let today = date(2024, 7, 10);
        assert!(matches!(
            check_new_test(&request(None, 9), today),
            Err(AppError::InvalidMedicalTestData(_))
        ));
        assert!(check_new_test(&request(None, 10), today).is_ok());
        assert!(check_new_test(&request(Some("doc@medfast.test"), 9), today).is_ok());
    }

    #[test]
    fn test_generation_rules() {
        let today = date(2024, 7, 10);
        assert!(check_generation(&row(1, 10), today).is_ok());
        assert!(check_generation(&row(1, 11), today).is_err());

        let mut done = row(1, 9);
        done.has_pdf = true;
        assert!(check_generation(&done, today).is_err());
    }

    #[test]
    fn test_result_access() {
        let test = row(1, 9);
        assert!(check_result_access(&user(5, Role::Patient), &test).is_ok());
        assert!(matches!(
            check_result_access(&user(6, Role::Patient), &test),
            Err(AppError::Forbidden(_))
        ));
        assert!(check_result_access(&user(6, Role::Doctor), &test).is_ok());
        assert!(check_result_access(&user(6, Role::Admin), &test).is_ok());
    }

    #[test]
    fn test_select_tests_newest_first() {
        let rows = vec![row(1, 1), row(2, 8), row(3, 5), row(4, 20)];
        let today = date(2024, 7, 10);

        let past = select_tests(rows.clone(), AppointmentRequestType::Past, 2, today);
        assert_eq!(past.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);

        let all_past = select_tests(rows.clone(), AppointmentRequestType::Past, 0, today);
        assert_eq!(all_past.len(), 3);

        let upcoming = select_tests(rows, AppointmentRequestType::Upcoming, 0, today);
        assert_eq!(upcoming.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_today_is_neither_past_nor_upcoming() {
        let today = date(2024, 7, 10);
        let rows = vec![row(1, 10)];
        assert!(select_tests(rows.clone(), AppointmentRequestType::Past, 0, today).is_empty());
        assert!(select_tests(rows, AppointmentRequestType::Upcoming, 0, today).is_empty());
    }

    #[test]
    fn test_response_without_doctor() {
        let mut test = row(3, 9);
        test.doctor_id = None;
        test.doctor_name = None;
        test.doctor_surname = None;
        let response = test.into_response().unwrap();

        assert_eq!(response.doctors_id, 0);
        assert_eq!(response.doctors_name, None);
        assert_eq!(response.test_category, MedicalTestCategory::Blood);
    }

    #[test]
    fn test_pdf_name() {
        assert_eq!(row(3, 9).pdf_name(), "John_Doe_2024-07-09.pdf");
    }

    #[test]
    fn test_result_input_carries_names() {
        let input = row(3, 9).result_input().unwrap();
        assert_eq!(input.patient_name, "John Doe");
        assert_eq!(input.doctor_name.as_deref(), Some("Gregory House"));
    }
}
