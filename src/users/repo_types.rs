use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// Youngest age a profile may carry.
pub const MIN_AGE: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// User record in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,    // always lowercase
    #[sqlx(rename = "password")]
    pub password_hash: String, // Argon2 PHC string, never exposed
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub genres: Vec<String>,
    pub created_at: PrimitiveDateTime,
    pub modified_at: PrimitiveDateTime,
}

/// Full set of profile values to write, after merging a patch onto a stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub genres: Vec<String>,
}

/// Input for a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Current UTC time without offset, truncated to microseconds like Postgres `TIMESTAMP`.
pub fn now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    let now = now
        .replace_nanosecond(now.microsecond() * 1_000)
        .unwrap_or(now);
    PrimitiveDateTime::new(now.date(), now.time())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
