//! In-process `UserStore` for tests. Mirrors the Postgres constraints the
//! service relies on: case-insensitive unique email and row-count based
//! `NotFound`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::UserStore;
use super::repo_types::{normalize_email, now_utc, NewUser, ProfileChanges, User};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        let email = normalize_email(&new.email);
        if users.values().any(|u| u.email == email) {
            return Err(AppError::DuplicateEmail);
        }
        let now = now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: new.password_hash,
            name: new.name,
            age: None,
            gender: None,
            genres: Vec::new(),
            created_at: now,
            modified_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<User> {
        let email = normalize_email(email);
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        let mut users = self.users.write().await;
        let email = normalize_email(&changes.email);
        if users.values().any(|u| u.id != id && u.email == email) {
            return Err(AppError::DuplicateEmail);
        }
        let user = users.get_mut(&id).ok_or(AppError::NotFound)?;
        user.email = email;
        user.name = changes.name;
        user.age = changes.age;
        user.gender = changes.gender;
        user.genres = changes.genres;
        user.modified_at = now_utc();
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(AppError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.modified_at = now_utc();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}
