use serde::{Deserialize, Serialize};

/// Audience a post is shown to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Connections,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Connections => "connections",
            Visibility::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "connections" => Some(Visibility::Connections),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Classify a MIME type such as `image/png` or `video/mp4`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_lowercase();
        if lower.starts_with("image/") {
            Some(MediaKind::Image)
        } else if lower.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Column the feed is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    LikesCount,
    CommentsCount,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::LikesCount => "likes_count",
            SortField::CommentsCount => "comments_count",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(SortField::CreatedAt),
            "likes_count" => Some(SortField::LikesCount),
            "comments_count" => Some(SortField::CommentsCount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_parse_is_case_insensitive() {
        assert_eq!(Visibility::parse("Connections"), Some(Visibility::Connections));
        assert_eq!(Visibility::parse("PRIVATE"), Some(Visibility::Private));
        assert_eq!(Visibility::parse("friends"), None);
    }

    #[test]
    fn test_media_kind_from_content_type() {
        assert_eq!(MediaKind::from_content_type("image/jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_content_type("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_content_type("application/pdf"), None);
    }

    #[test]
    fn test_sort_defaults() {
        assert_eq!(SortField::default().as_str(), "created_at");
        assert_eq!(SortDirection::default().as_str(), "desc");
    }
}
