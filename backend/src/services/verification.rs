//! E-mail verification tokens

use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Stored verification token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationToken {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub created_date: NaiveDateTime,
}

/// Outcome of comparing a submitted code against the stored token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationCheck {
    Expired,
    Mismatch,
    AlreadyVerified,
    Verified,
}

/// Decide what a verification attempt does, ignoring storage
pub fn check_code(
    stored: &VerificationToken,
    submitted: &str,
    user_enabled: bool,
    now: NaiveDateTime,
    timeout_secs: i64,
) -> VerificationCheck {
    if super::is_expired(stored.created_date, now, timeout_secs) {
        VerificationCheck::Expired
    } else if stored.token != submitted {
        VerificationCheck::Mismatch
    } else if user_enabled {
        VerificationCheck::AlreadyVerified
    } else {
        VerificationCheck::Verified
    }
}

/// Verification token service
#[derive(Clone)]
pub struct VerificationService {
    db: PgPool,
}

impl VerificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Replace the user's tokens with a fresh one and return its code
    pub async fn issue(
        conn: &mut PgConnection,
        user_id: i64,
        actor: &str,
        now: NaiveDateTime,
    ) -> AppResult<String> {
        let token = Uuid::new_v4().to_string();

        sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO verification_tokens (token, user_id, created_by, created_date,
                                             last_modified_by, last_modified_date)
            VALUES ($1, $2, $3, $4, $3, $4)
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(actor)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(token)
    }

    /// Latest token of the user with this e-mail
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<VerificationToken>> {
        let token = sqlx::query_as::<_, VerificationToken>(
            r#"
            SELECT v.id, v.token, v.user_id, v.created_date
            FROM verification_tokens v
            JOIN users u ON u.id = v.user_id
            WHERE u.email = $1
            ORDER BY v.created_date DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(token)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM verification_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
