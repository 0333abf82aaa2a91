use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Gender, User};

/// PATCH /profile body. Absent or empty fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub genres: Option<Vec<String>>,
}

/// PUT /password body.
#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

/// Public part of the user. Also the value stored in the profile cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub genres: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            age: user.age,
            gender: user.gender,
            genres: user.genres.clone(),
            created_at: user.created_at.assume_utc(),
            modified_at: user.modified_at.assume_utc(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub data: ProfileView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            name: "Ada".into(),
            age: Some(36),
            gender: Some(Gender::Female),
            genres: vec!["sci-fi".into(), "drama".into()],
            created_at: datetime!(2024-09-08 11:31:54),
            modified_at: datetime!(2024-09-09 08:00:00),
        }
    }

    #[test]
    fn profile_view_never_contains_password() {
        let json = serde_json::to_value(ProfileView::from(&user())).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn profile_view_wire_shape() {
        let u = user();
        let json = serde_json::to_value(ProfileView::from(&u)).unwrap();
        assert_eq!(json["id"], u.id.to_string());
        assert_eq!(json["gender"], "female");
        assert_eq!(json["genres"][1], "drama");
        assert_eq!(json["created_at"], "2024-09-08T11:31:54Z");
        assert_eq!(json["modified_at"], "2024-09-09T08:00:00Z");
    }

    #[test]
    fn patch_accepts_partial_bodies() {
        let patch: ProfilePatch = serde_json::from_str(r#"{"name":"Grace"}"#).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Grace"));
        assert!(patch.email.is_none() && patch.age.is_none() && patch.genres.is_none());

        let patch: ProfilePatch = serde_json::from_str("{}").unwrap();
        assert!(patch.gender.is_none());
    }
}
