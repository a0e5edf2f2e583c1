//! JWT issuing and validation, plus the logout blacklist

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use shared::Role;

use crate::config::TokenConfig;
use crate::error::{AppError, AppResult};
use crate::services::user::UserAccount;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // User e-mail
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_timeout: i64,
}

impl JwtService {
    pub fn new(config: &TokenConfig) -> AppResult<Self> {
        let key = config
            .signing_key_bytes()
            .map_err(|e| AppError::Internal(format!("Invalid signing key: {}", e)))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            access_timeout: config.access_timeout,
        })
    }

    /// Access token lifetime in seconds
    pub fn access_timeout(&self) -> i64 {
        self.access_timeout
    }

    pub fn generate_token(&self, user: &UserAccount) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.email.clone(),
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.access_timeout,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify the signature and expiry and return the claims
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn extract_username(&self, token: &str) -> AppResult<String> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// Subject matches the user and the token has not expired
    pub fn is_token_valid(&self, token: &str, user: &UserAccount) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.sub == user.email && claims.exp > Utc::now().timestamp(),
            Err(_) => false,
        }
    }
}

/// Tokens revoked by logout, remembered for one access token lifetime.
///
/// Unbounded: entries leave only through the TTL.
#[derive(Clone)]
pub struct TokenBlacklist {
    cache: Cache<String, ()>,
}

impl TokenBlacklist {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn blacklist(&self, token: &str) {
        self.cache.insert(token.to_string(), ());
    }

    pub fn is_blacklisted(&self, token: &str) -> bool {
        self.cache.contains_key(token)
    }
}
