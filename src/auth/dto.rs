use serde::{Deserialize, Serialize};

use super::services::{is_valid_email, MIN_PASSWORD_LEN};
use crate::error::{AppError, AppResult};
use crate::users::{dto::ProfileView, merge::MAX_NAME_LEN};

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after signup or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub data: ProfileView,
    pub token: String,
}

pub(crate) fn check_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }
    if !is_valid_email(email.trim()) {
        return Err(AppError::Validation(
            "email must be a valid email address".into(),
        ));
    }
    Ok(())
}

pub(crate) fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

impl SignupRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_email(&self.email)?;
        check_password(&self.password)?;
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "name cannot be longer than {MAX_NAME_LEN} characters"
            )));
        }
        Ok(())
    }
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_email(&self.email)?;
        check_password(&self.password)
    }
}
