//! Four digit one-time passwords for password resets

use chrono::NaiveDateTime;
use rand::Rng;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{email::EmailService, is_expired, now, user::UserService};

const NOT_FOUND_MESSAGE: &str = "One time password token is not found for user";

/// Stored one-time password
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OneTimePassword {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub created_date: NaiveDateTime,
}

/// Random code in 0000..=9999
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    format!("{:04}", rng.random_range(0..10_000))
}

/// One-time password service
#[derive(Clone)]
pub struct OtpService {
    db: PgPool,
    users: UserService,
    email: EmailService,
    timeout: i64,
}

impl OtpService {
    pub fn new(db: PgPool, config: &Config, email: EmailService) -> Self {
        Self {
            users: UserService::new(db.clone()),
            db,
            email,
            timeout: config.token.reset_password_timeout,
        }
    }

    /// Store a new code for the user and mail it
    pub async fn send_reset_password_email(&self, email: &str) -> AppResult<()> {
        let user = self.users.get_by_email(email).await?;
        let code = generate_code(&mut rand::rng());

        sqlx::query(
            r#"
            INSERT INTO one_time_passwords (token, user_id, created_by, created_date,
                                            last_modified_by, last_modified_date)
            VALUES ($1, $2, $3, $4, $3, $4)
            "#,
        )
        .bind(&code)
        .bind(user.id)
        .bind(&user.email)
        .bind(now())
        .execute(&self.db)
        .await?;

        tracing::info!(user_id = user.id, "Generated one-time password");
        self.email.send_reset_password(&user.email, &code).await
    }

    pub async fn find(&self, email: &str, token: &str) -> AppResult<Option<OneTimePassword>> {
        let otp = sqlx::query_as::<_, OneTimePassword>(
            r#"
            SELECT o.id, o.token, o.user_id, o.created_date
            FROM one_time_passwords o
            JOIN users u ON u.id = o.user_id
            WHERE u.email = $1 AND o.token = $2
            ORDER BY o.created_date DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        Ok(otp)
    }

    /// Existing code for this user, still inside its lifetime; expired codes are removed
    pub async fn verify(&self, email: &str, token: &str) -> AppResult<()> {
        let otp = self
            .find(email, token)
            .await?
            .ok_or_else(|| AppError::token_not_found(email, NOT_FOUND_MESSAGE))?;

        if is_expired(otp.created_date, now(), self.timeout) {
            sqlx::query("DELETE FROM one_time_passwords WHERE id = $1")
                .bind(otp.id)
                .execute(&self.db)
                .await?;
            return Err(AppError::token_expired(token, "One time password token is expired"));
        }

        Ok(())
    }

    /// Find the code used for a reset, failing like `verify` does
    pub async fn get(&self, email: &str, token: &str) -> AppResult<OneTimePassword> {
        self.find(email, token)
            .await?
            .ok_or_else(|| AppError::token_not_found(email, NOT_FOUND_MESSAGE))
    }

    pub async fn delete_for_user(&self, user_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM one_time_passwords WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
