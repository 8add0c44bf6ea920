use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{MediaKind, Visibility};

// The backend emits both RFC3339 and naive ISO-8601 timestamps; naive ones are UTC.
mod datetime_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
        }
    }
}

pub use datetime_format::parse as parse_timestamp;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default, with = "datetime_format")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author snapshot embedded in every post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl PostAuthor {
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{} {}", first, last)
            }
            _ => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub user: Option<PostAuthor>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub rich_content: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaKind>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "datetime_format")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "datetime_format")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete flag
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Whether the current user has liked this post (if the server reports it)
    #[serde(default, alias = "is_liked")]
    pub liked_by_me: Option<bool>,
}

// Auth

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// Posts

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub likes_count: i64,
    #[serde(default)]
    pub liked: Option<bool>,
}

/// Category and tag listings come back either bare or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    Bare(Vec<NameEntry>),
    Categories { categories: Vec<NameEntry> },
    Tags { tags: Vec<NameEntry> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NameEntry {
    Name(String),
    Tag { tag: String },
    Named { name: String },
}

impl NameList {
    pub fn into_names(self) -> Vec<String> {
        let entries = match self {
            NameList::Bare(e) => e,
            NameList::Categories { categories } => categories,
            NameList::Tags { tags } => tags,
        };
        entries
            .into_iter()
            .map(|entry| match entry {
                NameEntry::Name(n) => n,
                NameEntry::Tag { tag } => tag,
                NameEntry::Named { name } => name,
            })
            .collect()
    }
}

// Profiles

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub success: bool,
    pub profile: Profile,
}

/// Partial profile update; `None` fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileImageResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_post_from_backend_json() {
        let json = r#"{
            "id": 7,
            "user_id": 3,
            "content": "Hiring Rust engineers",
            "media_url": null,
            "media_type": null,
            "rich_content": "<p>Hiring</p>",
            "likes_count": 4,
            "comments_count": 1,
            "tags": ["rust", "jobs"],
            "visibility": "connections",
            "created_at": "2024-03-05T10:15:30.123456",
            "updated_at": "2024-03-05T10:15:30+00:00",
            "is_active": true,
            "user": {"id": 3, "username": "ada", "first_name": "Ada", "last_name": "Lovelace", "profile_image_url": null}
        }"#;

        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.visibility, Visibility::Connections);
        assert_eq!(post.tags, vec!["rust", "jobs"]);
        assert_eq!(post.liked_by_me, None);
        assert_eq!(post.user.as_ref().unwrap().display_name(), "Ada Lovelace");

        let created = post.created_at.unwrap();
        assert_eq!(created.year(), 2024);
        assert_eq!(created.hour(), 10);
        assert!(post.updated_at.is_some());
    }

    #[test]
    fn test_post_minimal_json_uses_defaults() {
        let post: Post = serde_json::from_str(r#"{"id": 1, "user_id": 2, "is_liked": true}"#).unwrap();
        assert!(post.is_active);
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.visibility, Visibility::Public);
        assert_eq!(post.liked_by_me, Some(true));
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let result: Result<Post, _> =
            serde_json::from_str(r#"{"id": 1, "user_id": 2, "created_at": "yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let author = PostAuthor {
            id: 1,
            username: "grace".to_string(),
            first_name: Some("Grace".to_string()),
            last_name: None,
            profile_image_url: None,
        };
        assert_eq!(author.display_name(), "grace");
    }

    #[test]
    fn test_name_list_shapes() {
        let bare: NameList = serde_json::from_str(r#"["Technology", "Career"]"#).unwrap();
        assert_eq!(bare.into_names(), vec!["Technology", "Career"]);

        let wrapped: NameList = serde_json::from_str(r#"{"categories": ["Technology"]}"#).unwrap();
        assert_eq!(wrapped.into_names(), vec!["Technology"]);

        let counted: NameList =
            serde_json::from_str(r#"{"tags": [{"tag": "rust", "count": 12}, "go"]}"#).unwrap();
        assert_eq!(counted.into_names(), vec!["rust", "go"]);
    }

    #[test]
    fn test_update_profile_request_skips_unset_fields() {
        let req = UpdateProfileRequest {
            bio: Some("Builder".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, serde_json::json!({"bio": "Builder"}));
    }
}
