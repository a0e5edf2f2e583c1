//! Password reset (via one-time password) and password change

use bcrypt::{hash, verify, DEFAULT_COST};
use shared::{ChangePasswordRequest, ResetPasswordRequest};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{
    email::EmailService,
    now,
    otp::OtpService,
    user::{UserAccount, UserService},
};

/// New password must differ from the stored one
pub fn check_reset(new_password: &str, current_hash: &str) -> AppResult<()> {
    if verify(new_password, current_hash)? {
        return Err(AppError::PasswordHistory);
    }
    Ok(())
}

/// Current password must match and differ from the new one
pub fn check_change(user: &UserAccount, request: &ChangePasswordRequest) -> AppResult<()> {
    if !verify(&request.current_password, &user.password_hash)? {
        return Err(AppError::InvalidCurrentPassword);
    }
    if request.current_password == request.new_password {
        return Err(AppError::PasswordRepetition);
    }
    Ok(())
}

/// Password service
#[derive(Clone)]
pub struct PasswordService {
    users: UserService,
    otp: OtpService,
}

impl PasswordService {
    pub fn new(db: PgPool, config: &Config, email: EmailService) -> Self {
        Self {
            users: UserService::new(db.clone()),
            otp: OtpService::new(db, config, email),
        }
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> AppResult<()> {
        self.otp.get(&request.email, &request.otp).await?;
        let user = self.users.get_by_email(&request.email).await?;

        if let Err(e) = check_reset(&request.new_password, &user.password_hash) {
            tracing::warn!(user_id = user.id, "Password reset rejected: password already used");
            return Err(e);
        }

        let password_hash = hash(&request.new_password, DEFAULT_COST)?;
        self.users.update_password(&user, &password_hash, now()).await?;
        self.otp.delete_for_user(user.id).await?;

        tracing::info!(user_id = user.id, "Password reset");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user: &UserAccount,
        request: &ChangePasswordRequest,
    ) -> AppResult<()> {
        check_change(user, request)?;

        let password_hash = hash(&request.new_password, DEFAULT_COST)?;
        self.users.update_password(user, &password_hash, now()).await?;

        tracing::info!(user_id = user.id, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::Role;

    fn user(password: &str) -> UserAccount {
        UserAccount {
            id: 3,
            email: "johndoe@gmail.com".to_string(),
            password_hash: hash(password, 4).unwrap(),
            enabled: true,
            role: Role::Patient,
            person_id: 3,
            name: "John".to_string(),
            surname: "Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    fn change(current: &str, new: &str) -> ChangePasswordRequest {
        ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        }
    }

    #[test]
    fn test_reset_to_same_password_violates_history() {
        let user = user("Password1!a");
        assert!(matches!(
            check_reset("Password1!a", &user.password_hash),
            Err(AppError::PasswordHistory)
        ));
        assert!(check_reset("Password2!a", &user.password_hash).is_ok());
    }

    #[test]
    fn test_change_requires_current_password() {
        let user = user("Password1!a");
        assert!(matches!(
            check_change(&user, &change("Wrong1!aaaa", "Password2!a")),
            Err(AppError::InvalidCurrentPassword)
        ));
    }

    #[test]
    fn test_change_rejects_repetition() {
        let user = user("Password1!a");
        assert!(matches!(
            check_change(&user, &change("Password1!a", "Password1!a")),
            Err(AppError::PasswordRepetition)
        ));
    }

    #[test]
    fn test_valid_change_accepted() {
        let user = user("Password1!a");
        assert!(check_change(&user, &change("Password1!a", "Password2!b")).is_ok());
    }
}
