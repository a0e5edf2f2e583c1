//! User accounts and their person records

use chrono::{NaiveDate, NaiveDateTime};
use shared::{Role, SignUpRequest};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult};

/// A user joined with the person it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub role: Role,
    pub person_id: i64,
    pub name: String,
    pub surname: String,
    pub birth_date: NaiveDate,
}

impl UserAccount {
    /// "Name Surname"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: String,
    enabled: bool,
    role: String,
    person_id: i64,
    name: String,
    surname: String,
    birth_date: NaiveDate,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(UserAccount {
            id: row.id,
            email: row.email,
            password_hash: row.password,
            enabled: row.enabled,
            role,
            person_id: row.person_id,
            name: row.name,
            surname: row.surname,
            birth_date: row.birth_date,
        })
    }
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.password, u.enabled, u.role, u.person_id,
           p.name, p.surname, p.birth_date
    FROM users u
    JOIN persons p ON p.id = u.person_id
"#;

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        row.map(UserAccount::try_from).transpose()
    }

    /// Like `find_by_email`, failing with `UserNotFound`
    pub async fn get_by_email(&self, email: &str) -> AppResult<UserAccount> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))
    }

    /// A user that also has the given role
    pub async fn get_by_email_and_role(&self, email: &str, role: Role) -> AppResult<UserAccount> {
        match self.find_by_email(email).await? {
            Some(user) if user.role == role => Ok(user),
            _ => Err(AppError::UserNotFound(email.to_string())),
        }
    }

    pub async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    pub async fn update_password(
        &self,
        user: &UserAccount,
        password_hash: &str,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password = $2, last_modified_by = $3, last_modified_date = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(password_hash)
        .bind(&user.email)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn enable(&self, user_id: i64, actor: &str, now: NaiveDateTime) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET enabled = TRUE, last_modified_by = $2, last_modified_date = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(actor)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Remove a user together with its person and patient rows.
    ///
    /// Tokens and OTPs cascade from `users`, the patient row from `persons`.
    pub async fn delete_account(&self, user_id: i64, person_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(person_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Insert person, patient and a disabled PATIENT user inside the caller's transaction
    pub async fn create_patient(
        conn: &mut PgConnection,
        request: &SignUpRequest,
        password_hash: &str,
        now: NaiveDateTime,
    ) -> AppResult<UserAccount> {
        const ACTOR: &str = "system";

        let person_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO persons (name, surname, birth_date, sex, citizenship, street_address,
                                 house, apartment, city, state, zip, phone,
                                 created_by, created_date, last_modified_by, last_modified_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $13, $14)
            RETURNING id
            "#,
        )
        .bind(&request.name)
        .bind(&request.surname)
        .bind(request.birth_date)
        .bind(&request.sex)
        .bind(&request.citizenship)
        .bind(&request.street_address)
        .bind(&request.house)
        .bind(&request.apartment)
        .bind(&request.city)
        .bind(&request.state)
        .bind(&request.zip)
        .bind(&request.phone)
        .bind(ACTOR)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO patients (id, checkbox_terms_and_conditions) VALUES ($1, FALSE)",
        )
        .bind(person_id)
        .execute(&mut *conn)
        .await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, password, enabled, role, person_id,
                               created_by, created_date, last_modified_by, last_modified_date)
            VALUES ($1, $2, FALSE, $3, $4, $5, $6, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&request.email)
        .bind(password_hash)
        .bind(Role::Patient.as_str())
        .bind(person_id)
        .bind(ACTOR)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::UserAlreadyExists(request.email.clone())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(UserAccount {
            id: user_id,
            email: request.email.clone(),
            password_hash: password_hash.to_string(),
            enabled: false,
            role: Role::Patient,
            person_id,
            name: request.name.clone(),
            surname: request.surname.clone(),
            birth_date: request.birth_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_parses_role() {
        let row = UserRow {
            id: 7,
            email: "doctor@medfast.test".to_string(),
            password: "hash".to_string(),
            enabled: true,
            role: "DOCTOR".to_string(),
            person_id: 3,
            name: "John".to_string(),
            surname: "Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
        };

        let user = UserAccount::try_from(row).unwrap();
        assert_eq!(user.role, Role::Doctor);
        assert_eq!(user.full_name(), "John Doe");
    }

    #[test]
    fn test_row_conversion_rejects_unknown_role() {
        let row = UserRow {
            id: 7,
            email: "x@medfast.test".to_string(),
            password: "hash".to_string(),
            enabled: true,
            role: "NURSE".to_string(),
            person_id: 3,
            name: "John".to_string(),
            surname: "Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
        };

        assert!(matches!(UserAccount::try_from(row), Err(AppError::Internal(_))));
    }
}
