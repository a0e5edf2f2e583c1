//! Authentication service: registration, e-mail verification, sign-in, token refresh and logout

use bcrypt::{hash, verify, DEFAULT_COST};
use shared::{JwtAuthenticationResponse, RefreshTokenRequest, SignInRequest, SignUpRequest};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{
    email::EmailService,
    is_expired,
    jwt::{JwtService, TokenBlacklist},
    now,
    refresh_token::RefreshTokenService,
    remaining_lifetime,
    user::{UserAccount, UserService},
    verification::{check_code, VerificationCheck, VerificationService},
};

pub const SIGN_UP_MESSAGE: &str = "Email verification link has been sent to your email";

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    users: UserService,
    verification: VerificationService,
    refresh_tokens: RefreshTokenService,
    jwt: JwtService,
    blacklist: TokenBlacklist,
    email: EmailService,
    code_timeout: i64,
    refresh_timeout: i64,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        config: &Config,
        jwt: JwtService,
        blacklist: TokenBlacklist,
        email: EmailService,
    ) -> Self {
        Self {
            users: UserService::new(db.clone()),
            verification: VerificationService::new(db.clone()),
            refresh_tokens: RefreshTokenService::new(db.clone()),
            db,
            jwt,
            blacklist,
            email,
            code_timeout: config.verification.code_timeout,
            refresh_timeout: config.token.refresh_timeout,
        }
    }

    /// Register a disabled patient and e-mail the verification link.
    ///
    /// The account is committed before the mail goes out and deleted again
    /// when delivery fails. A concurrent duplicate hits the unique e-mail
    /// constraint and gets `UserAlreadyExists`.
    pub async fn sign_up(&self, request: &SignUpRequest) -> AppResult<&'static str> {
        if self.users.exists_by_email(&request.email).await? {
            return Err(AppError::UserAlreadyExists(request.email.clone()));
        }

        let password_hash = hash(&request.password, DEFAULT_COST)?;
        let now = now();

        let mut tx = self.db.begin().await?;
        let user = UserService::create_patient(&mut tx, request, &password_hash, now).await?;
        let code = VerificationService::issue(&mut tx, user.id, "system", now).await?;
        tx.commit().await?;

        if let Err(e) = self
            .email
            .send_verification(&user.email, &user.name, &code)
            .await
        {
            tracing::warn!(
                user_id = user.id,
                error = %e,
                "Verification mail failed, removing account"
            );
            self.users.delete_account(user.id, user.person_id).await?;
            return Err(e);
        }

        tracing::info!(user_id = user.id, "Patient registered, verification pending");
        Ok(SIGN_UP_MESSAGE)
    }

    /// Send a fresh verification link to a user that has not verified yet
    pub async fn send_verification_email(&self, email: &str) -> AppResult<()> {
        let user = self.users.get_by_email(email).await?;
        if user.enabled {
            return Err(AppError::UserAlreadyVerified(email.to_string()));
        }

        let mut tx = self.db.begin().await?;
        let code = VerificationService::issue(&mut tx, user.id, &user.email, now()).await?;
        tx.commit().await?;

        self.email
            .send_verification(&user.email, &user.name, &code)
            .await?;

        tracing::info!(user_id = user.id, "Verification e-mail re-sent");
        Ok(())
    }

    pub async fn verify(&self, email: &str, code: &str) -> AppResult<()> {
        let stored = self
            .verification
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::token_not_found(email, "Verification token not found"))?;
        let user = self.users.get_by_email(email).await?;
        let now = now();

        match check_code(&stored, code, user.enabled, now, self.code_timeout) {
            VerificationCheck::Expired => {
                self.verification.delete(stored.id).await?;
                Err(AppError::token_expired(code, "Verification code has expired"))
            }
            VerificationCheck::Mismatch => Err(AppError::InvalidVerificationCode),
            VerificationCheck::AlreadyVerified => {
                self.verification.delete(stored.id).await?;
                Err(AppError::UserAlreadyVerified(email.to_string()))
            }
            VerificationCheck::Verified => {
                self.users.enable(user.id, &user.email, now).await?;
                self.verification.delete(stored.id).await?;
                tracing::info!(user_id = user.id, "E-mail verified");
                Ok(())
            }
        }
    }

    pub async fn sign_in(&self, request: &SignInRequest) -> AppResult<JwtAuthenticationResponse> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AppError::BadCredentials)?;

        authenticate(&user, &request.password)?;

        let access_token = self.jwt.generate_token(&user)?;
        let refresh_token = self
            .refresh_tokens
            .generate(user.id, &user.email, now())
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User signed in");

        Ok(JwtAuthenticationResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_timeout(),
            refresh_expires_in: self.refresh_timeout,
        })
    }

    /// New access token for a live refresh token; the refresh token is kept
    pub async fn refresh(
        &self,
        request: &RefreshTokenRequest,
    ) -> AppResult<JwtAuthenticationResponse> {
        let stored = self
            .refresh_tokens
            .find(&request.refresh_token)
            .await?
            .ok_or_else(|| {
                AppError::token_not_found(&request.refresh_token, "Refresh token not found")
            })?;

        let now = now();
        if is_expired(stored.created_date, now, self.refresh_timeout) {
            self.refresh_tokens.delete(stored.id).await?;
            return Err(AppError::token_expired(
                &request.refresh_token,
                "Refresh token was expired. Please make a new sign in request",
            ));
        }

        let user = self.users.get_by_email(&stored.email).await?;

        Ok(JwtAuthenticationResponse {
            access_token: self.jwt.generate_token(&user)?,
            refresh_token: request.refresh_token.clone(),
            expires_in: self.jwt.access_timeout(),
            refresh_expires_in: remaining_lifetime(stored.created_date, now, self.refresh_timeout),
        })
    }

    /// Blacklist the access token and drop every refresh token of its owner
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        let email = self.jwt.extract_username(token)?;
        let user = self.users.get_by_email(&email).await?;

        self.blacklist.blacklist(token);
        let removed = self.refresh_tokens.delete_for_user(user.id).await?;

        tracing::info!(user_id = user.id, refresh_tokens = removed, "User logged out");
        Ok(())
    }
}

/// Password check first, then the enabled flag
pub fn authenticate(user: &UserAccount, password: &str) -> AppResult<()> {
    if !verify(password, &user.password_hash)? {
        return Err(AppError::BadCredentials);
    }
    if !user.enabled {
        return Err(AppError::UserDisabled);
    }
    Ok(())
}
