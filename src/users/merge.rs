use super::dto::ProfilePatch;
use super::repo_types::{normalize_email, ProfileChanges, User, MIN_AGE};
use crate::auth::services::is_valid_email;
use crate::error::{AppError, AppResult};

pub const MAX_NAME_LEN: usize = 50;

/// Merge-on-absence: every field the patch leaves empty takes the stored value.
///
/// Age is "absent" when it is missing or below `MIN_AGE` while the stored age
/// is not, so a zero never overwrites a real age.
pub fn merge(existing: &User, patch: &ProfilePatch) -> ProfileChanges {
    let email = patch
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| existing.email.clone());

    let name = patch
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| existing.name.clone());

    let age = match patch.age {
        None => existing.age,
        Some(age) if age < MIN_AGE && existing.age.is_some_and(|a| a >= MIN_AGE) => existing.age,
        Some(age) => Some(age),
    };

    let genres = match &patch.genres {
        Some(genres) if !genres.is_empty() => genres.clone(),
        _ => existing.genres.clone(),
    };

    ProfileChanges {
        email,
        name,
        age,
        gender: patch.gender.or(existing.gender),
        genres,
    }
}

/// Field checks applied to the merged result, before anything is written.
pub fn validate(changes: &ProfileChanges) -> AppResult<()> {
    if !is_valid_email(&changes.email) {
        return Err(AppError::Validation(
            "email must be a valid email address".into(),
        ));
    }
    if changes.name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name cannot be longer than {MAX_NAME_LEN} characters"
        )));
    }
    if let Some(age) = changes.age {
        if age < MIN_AGE {
            return Err(AppError::Validation(format!(
                "age must be greater than or equal to {MIN_AGE}"
            )));
        }
    }
    if changes.genres.iter().any(|g| g.trim().is_empty()) {
        return Err(AppError::Validation("genres cannot contain blank entries".into()));
    }
    Ok(())
}
