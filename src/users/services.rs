use tracing::{info, instrument};

use super::{
    dto::ProfilePatch,
    merge::{merge, validate},
    repo_types::User,
};
use crate::{
    auth::password::{hash_password, verify_password},
    error::{AppError, AppResult},
    state::AppState,
};

/// Merges the patch onto `current`, writes it, then refreshes the cache entry.
///
/// Concurrent patches to the same user are last-commit-wins: the merge is
/// computed from the row read by the session extractor, not re-read here.
#[instrument(skip(state, current, patch), fields(user_id = %current.id))]
pub async fn apply_profile_patch(
    state: &AppState,
    current: &User,
    patch: &ProfilePatch,
) -> AppResult<User> {
    let changes = merge(current, patch);
    validate(&changes)?;

    let user = state.users.update_profile(current.id, changes).await?;
    state.cache.upsert(&user).await;

    info!("profile updated");
    Ok(user)
}

#[instrument(skip(state, current, new_password), fields(user_id = %current.id))]
pub async fn change_password(
    state: &AppState,
    current: &User,
    new_password: &str,
) -> AppResult<()> {
    if verify_password(new_password, &current.password_hash)? {
        return Err(AppError::SamePassword);
    }
    let hash = hash_password(new_password)?;
    state.users.update_password(current.id, &hash).await?;

    info!("password changed");
    Ok(())
}

#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn delete_account(state: &AppState, current: &User) -> AppResult<()> {
    state.users.delete(current.id).await?;
    state.cache.remove(current.id).await;

    info!("account deleted");
    Ok(())
}
