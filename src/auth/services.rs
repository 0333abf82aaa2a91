use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::password::{burn_verify, hash_password, verify_password};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::{normalize_email, NewUser, User},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn issue_session(state: &AppState, user_id: Uuid) -> AppResult<String> {
    Ok(state.keys.sign(user_id)?)
}

/// Token to live user. Bad tokens and deleted subjects both end as `Unauthorized`.
pub async fn verify_session(state: &AppState, token: &str) -> AppResult<User> {
    let user_id = state.keys.verify(token).map_err(|e| {
        warn!(reason = %e, "session token rejected");
        AppError::from(e)
    })?;
    match state.users.get_by_id(user_id).await {
        Ok(user) => Ok(user),
        Err(AppError::NotFound) => {
            warn!(user_id = %user_id, "session subject no longer exists");
            Err(AppError::Unauthorized)
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, password))]
pub async fn create_account(
    state: &AppState,
    email: &str,
    password: &str,
    name: &str,
) -> AppResult<(User, String)> {
    let email = normalize_email(email);

    // Fast path only; the unique index decides under concurrent signups.
    match state.users.get_by_email(&email).await {
        Ok(_) => return Err(AppError::DuplicateEmail),
        Err(AppError::NotFound) => {}
        Err(e) => return Err(e),
    }

    let password_hash = hash_password(password)?;
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            name: name.trim().to_string(),
        })
        .await?;

    state.cache.upsert(&user).await;

    let token = issue_session(state, user.id)?;
    info!(user_id = %user.id, "account created");
    Ok((user, token))
}

#[instrument(skip(state, password))]
pub async fn authenticate(
    state: &AppState,
    email: &str,
    password: &str,
) -> AppResult<(User, String)> {
    let user = match state.users.get_by_email(email).await {
        Ok(user) => user,
        Err(AppError::NotFound) => {
            burn_verify(password);
            warn!("login for unknown email");
            return Err(AppError::AuthFailed);
        }
        Err(e) => return Err(e),
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AppError::AuthFailed);
    }

    let token = issue_session(state, user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}
