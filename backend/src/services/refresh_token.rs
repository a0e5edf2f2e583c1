//! Refresh tokens, stored as SHA-256 digests

use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Stored refresh token row joined with its owner's e-mail
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredRefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub created_date: NaiveDateTime,
}

/// Digest persisted in place of the raw token
pub fn hash_token(token: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Refresh token service
#[derive(Clone)]
pub struct RefreshTokenService {
    db: PgPool,
}

impl RefreshTokenService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a token for the user; only the digest is stored
    pub async fn generate(
        &self,
        user_id: i64,
        actor: &str,
        now: NaiveDateTime,
    ) -> AppResult<String> {
        let token = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_by, created_date,
                                        last_modified_by, last_modified_date)
            VALUES ($1, $2, $3, $4, $3, $4)
            "#,
        )
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(actor)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(token)
    }

    pub async fn find(&self, token: &str) -> AppResult<Option<StoredRefreshToken>> {
        let stored = sqlx::query_as::<_, StoredRefreshToken>(
            r#"
            SELECT r.id, r.user_id, u.email, r.created_date
            FROM refresh_tokens r
            JOIN users u ON u.id = r.user_id
            WHERE r.token = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.db)
        .await?;

        Ok(stored)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn delete_for_user(&self, user_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
