/// Data models for story-service
///
/// This module defines the story entity and its lifecycle arithmetic.
/// A story is the sole persisted entity of the service: created by the
/// publisher, mutated only by view tracking, destroyed by an authorized
/// delete or by the expiration sweeper.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Fixed story lifetime. Every story expires exactly this long after it was
/// created; there is no per-story override.
pub const STORY_TTL_HOURS: i64 = 24;

/// The fixed TTL as a chrono duration.
pub fn story_ttl() -> Duration {
    Duration::hours(STORY_TTL_HOURS)
}

/// Kind of media a story carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Derive the media type from an upload's MIME content type.
    /// Only `image/*` and `video/*` are accepted.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime: mime::Mime = content_type.parse().ok()?;
        match mime.type_() {
            mime::IMAGE => Some(MediaType::Image),
            mime::VIDEO => Some(MediaType::Video),
            _ => None,
        }
    }
}

/// An ephemeral story record.
///
/// `views` is a set of distinct viewer identities, not a counter: re-adding
/// a viewer is a no-op and its size is the unique-viewer count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    /// Identity of the creator (authenticated uid or anonymous visitor id).
    /// Used for ownership checks, never for display ordering.
    pub author_id: String,
    /// Human-readable label, denormalized onto the record for display
    /// without a join.
    pub author_name: String,
    pub media_url: String,
    /// Object key inside the media store; kept so media can be deleted
    /// together with the record.
    pub media_path: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
    /// `created_at + STORY_TTL_HOURS`, computed once at publish time and
    /// never recomputed.
    pub expires_at: DateTime<Utc>,
    pub views: BTreeSet<String>,
}

impl Story {
    /// A story is expired once `now` has reached its expiration timestamp.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Number of distinct viewers.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_at(created_at: DateTime<Utc>) -> Story {
        Story {
            id: Uuid::new_v4(),
            author_id: "visitor-1".to_string(),
            author_name: "Maria".to_string(),
            media_url: "http://localhost/media/stories/a.jpg".to_string(),
            media_path: "stories/a.jpg".to_string(),
            media_type: MediaType::Image,
            created_at,
            expires_at: created_at + story_ttl(),
            views: BTreeSet::new(),
        }
    }

    #[test]
    fn expires_exactly_at_ttl_boundary() {
        let created = Utc::now();
        let story = story_at(created);

        assert_eq!(story.expires_at, created + Duration::hours(24));
        assert!(!story.is_expired(created + Duration::hours(24) - Duration::seconds(1)));
        assert!(story.is_expired(created + Duration::hours(24)));
        assert!(story.is_expired(created + Duration::hours(25)));
    }

    #[test]
    fn media_type_from_content_type() {
        assert_eq!(
            MediaType::from_content_type("image/jpeg"),
            Some(MediaType::Image)
        );
        assert_eq!(
            MediaType::from_content_type("video/mp4"),
            Some(MediaType::Video)
        );
        assert_eq!(
            MediaType::from_content_type("image/png; charset=binary"),
            Some(MediaType::Image)
        );
        assert_eq!(MediaType::from_content_type("application/pdf"), None);
        assert_eq!(MediaType::from_content_type(""), None);
    }

    #[test]
    fn views_is_a_set() {
        let mut story = story_at(Utc::now());
        story.views.insert("viewer-b".to_string());
        story.views.insert("viewer-b".to_string());
        story.views.insert("viewer-c".to_string());

        assert_eq!(story.view_count(), 2);
    }
}
