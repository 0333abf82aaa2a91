use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::repo_types::{normalize_email, now_utc, NewUser, ProfileChanges, User};
use crate::error::{AppError, AppResult};

/// Authoritative storage for user records.
///
/// Every mutating call runs in its own transaction and commits exactly one
/// logical write. An error leaves nothing behind.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> AppResult<User>;

    /// Case-insensitive lookup. `NotFound` when absent.
    async fn get_by_email(&self, email: &str) -> AppResult<User>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<User>;

    /// Writes an already merged profile and bumps `modified_at`.
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// A second delete of the same id reports `NotFound` again.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Unique-constraint violations become `DuplicateEmail`; the only unique column is email.
fn map_conflict(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateEmail,
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let now = now_utc();
        let mut tx = self.db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password, name, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, email, password, name, age, gender, genres, created_at, modified_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(normalize_email(&new.email))
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_conflict)?;
        tx.commit().await?;
        debug!(user_id = %user.id, "user row inserted");
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, name, age, gender, genres, created_at, modified_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, name, age, gender, genres, created_at, modified_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        let mut tx = self.db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email = $2, name = $3, age = $4, gender = $5, genres = $6, modified_at = $7
             WHERE id = $1
            RETURNING id, email, password, name, age, gender, genres, created_at, modified_at
            "#,
        )
        .bind(id)
        .bind(normalize_email(&changes.email))
        .bind(&changes.name)
        .bind(changes.age)
        .bind(changes.gender)
        .bind(&changes.genres)
        .bind(now_utc())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_conflict)?
        .ok_or(AppError::NotFound)?;
        tx.commit().await?;
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let done = sqlx::query(
            r#"
            UPDATE users
               SET password = $2, modified_at = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(now_utc())
        .execute(&mut *tx)
        .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod pg_tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".into(),
            name: "Ada".into(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at Postgres"]
    async fn duplicate_email_is_rejected_case_insensitively(pool: PgPool) {
        let store = PgUserStore::new(pool.clone());
        let first = store.create(new_user("Ada@Example.com")).await.unwrap();
        assert_eq!(first.email, "ada@example.com");
        assert_eq!(first.created_at, first.modified_at);

        let err = store.create(new_user("ADA@example.COM")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at Postgres"]
    async fn delete_twice_reports_not_found(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let user = store.create(new_user("gone@example.com")).await.unwrap();
        store.delete(user.id).await.unwrap();
        assert!(matches!(store.delete(user.id).await, Err(AppError::NotFound)));
        assert!(matches!(store.get_by_id(user.id).await, Err(AppError::NotFound)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at Postgres"]
    async fn update_profile_conflicting_email_leaves_row_untouched(pool: PgPool) {
        let store = PgUserStore::new(pool);
        store.create(new_user("taken@example.com")).await.unwrap();
        let user = store.create(new_user("mine@example.com")).await.unwrap();

        let changes = ProfileChanges {
            email: "Taken@example.com".into(),
            name: "Renamed".into(),
            age: Some(30),
            gender: None,
            genres: vec!["drama".into()],
        };
        let err = store.update_profile(user.id, changes).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));

        let reread = store.get_by_id(user.id).await.unwrap();
        assert_eq!(reread, user);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at Postgres"]
    async fn update_password_on_missing_user_is_not_found(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let err = store.update_password(Uuid::new_v4(), "hash").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
