//! Client-side validation for everything the user submits: new posts, media
//! attachments, profile edits and the auth forms. Invalid input is reported
//! per field and never reaches the network.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use prok_types::{MediaKind, Post, SignupRequest, UpdateProfileRequest, Visibility};
use regex::Regex;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};

const MIB: u64 = 1024 * 1024;

pub const MAX_IMAGE_BYTES: u64 = 5 * MIB;
pub const MAX_VIDEO_BYTES: u64 = 10 * MIB;
pub const MAX_PROFILE_IMAGE_BYTES: u64 = 5 * MIB;

pub const MAX_CONTENT_CHARS: usize = 5000;
pub const MAX_TAGS_CHARS: usize = 200;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const VIDEO_TYPES: &[&str] = &["video/mp4", "video/avi", "video/quicktime", "video/x-ms-wmv"];

static WEBSITE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+").expect("valid regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("valid regex"));
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});
static PASSWORD_SPECIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("valid regex"));

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. A later message for the same field replaces the earlier one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

// Media

/// A file picked for upload, held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// What the composer shows for an accepted attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPreview {
    pub kind: MediaKind,
    pub file_name: String,
    pub size: u64,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(path).unwrap_or("application/octet-stream");

        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check type and size for a post attachment.
    pub fn validate(&self) -> Result<MediaPreview, String> {
        let kind = validate_media(&self.content_type, self.size())?;
        Ok(MediaPreview {
            kind,
            file_name: self.file_name.clone(),
            size: self.size(),
        })
    }
}

/// Size limits are per kind, but the message matches what users have always been shown.
pub fn validate_media(content_type: &str, size: u64) -> Result<MediaKind, String> {
    let (kind, limit) = if IMAGE_TYPES.contains(&content_type) {
        (MediaKind::Image, MAX_IMAGE_BYTES)
    } else if VIDEO_TYPES.contains(&content_type) {
        (MediaKind::Video, MAX_VIDEO_BYTES)
    } else {
        return Err("Invalid file type. Allowed: images and videos".to_string());
    };

    if size > limit {
        return Err("File size must be less than 10MB".to_string());
    }
    Ok(kind)
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "avi" => "video/avi",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        _ => return None,
    };
    Some(content_type)
}

// Posts

/// A post being composed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDraft {
    pub content: String,
    pub rich_content: Option<String>,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub category: Option<String>,
    pub media: Option<MediaFile>,
}

impl PostDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Parse a comma separated tag field, dropping blanks.
    pub fn with_tags_csv(mut self, tags: &str) -> Self {
        self.tags = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let has_rich = self
            .rich_content
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if self.content.trim().is_empty() && !has_rich && self.media.is_none() {
            errors.add("content", "Post content is required");
        }

        if self.content.chars().count() > MAX_CONTENT_CHARS {
            errors.add("content", "Content must be less than 5000 characters");
        }

        if self.tags.join(",").chars().count() > MAX_TAGS_CHARS {
            errors.add("tags", "Tags must be less than 200 characters");
        }

        if let Some(media) = &self.media {
            if let Err(message) = media.validate() {
                errors.add("media", message);
            }
        }

        errors.into_result()
    }
}

/// Why a post was not created.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Validate `draft` and create it. Invalid drafts never reach the network.
pub async fn submit_post(api: &ApiClient, draft: &PostDraft) -> Result<Post, SubmitError> {
    draft.validate()?;
    Ok(api.create_post(draft).await?)
}

// Profile

/// Raw profile edit form. Empty fields are left unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub company: String,
    pub job_title: String,
    pub website: String,
    pub phone: String,
    /// As typed
    pub experience_years: String,
    /// Comma separated
    pub skills: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_len(&mut errors, "first_name", &self.first_name, 50, "First name must be 50 characters or less");
        check_len(&mut errors, "last_name", &self.last_name, 50, "Last name must be 50 characters or less");
        check_len(&mut errors, "bio", &self.bio, 1000, "Bio must be 1000 characters or less");
        check_len(&mut errors, "location", &self.location, 100, "Location must be 100 characters or less");
        check_len(&mut errors, "company", &self.company, 100, "Company must be 100 characters or less");
        check_len(&mut errors, "job_title", &self.job_title, 100, "Job title must be 100 characters or less");

        if !self.website.is_empty() && !WEBSITE_RE.is_match(&self.website) {
            errors.add(
                "website",
                "Website must be a valid URL starting with http:// or https://",
            );
        }

        if !self.phone.is_empty() {
            let digits: String = self
                .phone
                .chars()
                .filter(|c| !matches!(c, ' ' | '\t' | '-' | '(' | ')'))
                .collect();
            if !PHONE_RE.is_match(&digits) {
                errors.add("phone", "Please enter a valid phone number");
            }
        }

        if !self.experience_years.trim().is_empty() && self.years().is_none() {
            errors.add(
                "experience_years",
                "Experience years must be between 0 and 50",
            );
        }

        errors.into_result()
    }

    fn years(&self) -> Option<i32> {
        self.experience_years
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|y| (0..=50).contains(y))
    }

    /// Validate and build the update body.
    pub fn to_request(&self) -> Result<UpdateProfileRequest, ValidationErrors> {
        self.validate()?;

        let text = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        let skills: Vec<String> = self
            .skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(UpdateProfileRequest {
            first_name: text(&self.first_name),
            last_name: text(&self.last_name),
            bio: text(&self.bio),
            location: text(&self.location),
            company: text(&self.company),
            job_title: text(&self.job_title),
            website: text(&self.website),
            phone: text(&self.phone),
            experience_years: self.years(),
            skills: (!skills.is_empty()).then_some(skills),
            ..Default::default()
        })
    }
}

fn check_len(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max: usize,
    message: &str,
) {
    if value.chars().count() > max {
        errors.add(field, message);
    }
}

/// A new profile picture.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileImage {
    pub file: MediaFile,
}

impl ProfileImage {
    pub fn new(file: MediaFile) -> Result<Self, ValidationErrors> {
        let image = Self { file };
        image.validate()?;
        Ok(image)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.file.size() > MAX_PROFILE_IMAGE_BYTES {
            errors.add("image", "Image size must be less than 5MB");
        } else if !IMAGE_TYPES.contains(&self.file.content_type.as_str()) {
            errors.add(
                "image",
                "Please upload a valid image file (JPEG, PNG, GIF, WebP)",
            );
        }
        errors.into_result()
    }
}

// Auth forms

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub username_or_email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.username_or_email.trim().is_empty() {
            errors.add("username_or_email", "Username or email is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self.username.trim();
        let username_len = username.chars().count();
        if username.is_empty() {
            errors.add("username", "Username is required");
        } else if !(3..=80).contains(&username_len) {
            errors.add("username", "Username must be between 3 and 80 characters");
        } else if !USERNAME_RE.is_match(username) {
            errors.add(
                "username",
                "Username can only contain letters, numbers, underscores, and hyphens",
            );
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !EMAIL_RE.is_match(email) {
            errors.add("email", "Invalid email format");
        }

        if let Err(message) = check_password(&self.password) {
            errors.add("password", message);
        }

        errors.into_result()
    }

    pub fn to_request(&self) -> Result<SignupRequest, ValidationErrors> {
        self.validate()?;
        Ok(SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

fn check_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = PASSWORD_SPECIAL_RE.is_match(password);

    if !(has_upper && has_lower && has_digit && has_special) {
        return Err("Password must contain uppercase, lowercase, digit, and special character");
    }
    Ok(())
}
