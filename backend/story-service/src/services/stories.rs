/// Story lifecycle service
///
/// Publishing, reads, live subscriptions, idempotent view tracking, and
/// gated deletion. The service is the only writer of persisted story state;
/// everything it persists goes through the `StoryStore` contract.
use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::media::MediaStore;
use crate::metrics::stories as metrics;
use crate::models::{story_ttl, MediaType, Story};
use crate::store::{StoryFilter, StoryStore, StorySubscription};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Raw upload accepted by `publish`.
#[derive(Debug, Clone)]
pub struct NewStoryUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Pure permission check gating destructive story operations: admins may
/// delete anything, everyone else only their own stories.
pub fn can_delete(story: &Story, actor: &Actor) -> bool {
    actor.is_admin || actor.id == story.author_id
}

pub struct StoriesService {
    store: Arc<dyn StoryStore>,
    media: Arc<dyn MediaStore>,
    clock: Arc<dyn Clock>,
}

impl StoriesService {
    pub fn new(
        store: Arc<dyn StoryStore>,
        media: Arc<dyn MediaStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            media,
            clock,
        }
    }

    /// Publish a new story: persist the media first, then write the record
    /// with its expiration fixed at creation time.
    ///
    /// If the media upload fails the record is never written. If the record
    /// write fails after a successful upload, the media object is orphaned;
    /// that is logged and tolerated.
    pub async fn publish(&self, upload: NewStoryUpload, actor: &Actor) -> Result<Story> {
        let media_type = MediaType::from_content_type(&upload.content_type).ok_or_else(|| {
            AppError::BadRequest(format!(
                "unsupported story content type '{}'",
                upload.content_type
            ))
        })?;

        let id = Uuid::new_v4();
        let extension = match media_type {
            MediaType::Image => "jpg",
            MediaType::Video => "mp4",
        };
        let media_path = format!("stories/{}.{}", id, extension);

        let media_url = self
            .media
            .put(upload.bytes, &media_path, &upload.content_type)
            .await?;

        let created_at = self.clock.now();
        let story = Story {
            id,
            author_id: actor.id.clone(),
            author_name: actor.display_name.clone(),
            media_url,
            media_path: media_path.clone(),
            media_type,
            created_at,
            expires_at: created_at + story_ttl(),
            views: BTreeSet::new(),
        };

        if let Err(e) = self.store.put(story.clone()).await {
            tracing::warn!(
                story_id = %id,
                media_path = %media_path,
                error = %e,
                "story record write failed after upload, media object orphaned"
            );
            return Err(AppError::Write(e.to_string()));
        }

        metrics::record_story_published(media_type.as_str());
        tracing::info!(story_id = %id, author = %actor.id, media_type = media_type.as_str(), "story published");
        Ok(story)
    }

    /// One story by id for the public single-story route. Expired records
    /// read as missing.
    pub async fn get_public(&self, id: Uuid) -> Result<Story> {
        let story = self.store.get(id).await?;
        if story.is_expired(self.clock.now()) {
            return Err(AppError::NotFound(format!("story {} has expired", id)));
        }
        Ok(story)
    }

    /// Active stories, oldest first.
    pub async fn list_active(&self) -> Result<Vec<Story>> {
        self.store.query_active(self.clock.now()).await
    }

    /// Every story, expired or not. Administrative view.
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Story>> {
        if !actor.is_admin {
            return Err(AppError::PermissionDenied(
                "administrative story view requires admin".to_string(),
            ));
        }
        self.store.query_all().await
    }

    /// Live query over the active set.
    pub async fn subscribe_active(&self) -> Result<StorySubscription> {
        self.store.subscribe(StoryFilter::Active).await
    }

    /// Live query over the full collection. Administrative view.
    pub async fn subscribe_all(&self, actor: &Actor) -> Result<StorySubscription> {
        if !actor.is_admin {
            return Err(AppError::PermissionDenied(
                "administrative story view requires admin".to_string(),
            ));
        }
        self.store.subscribe(StoryFilter::All).await
    }

    /// Record that `viewer` has seen the story. Set-union semantics: the
    /// store applies an atomic set-add, so repeats and concurrent viewers
    /// both converge. Returns the unique-viewer count.
    pub async fn mark_viewed(&self, id: Uuid, viewer: &str) -> Result<usize> {
        let count = self.store.add_view(id, viewer).await?;
        metrics::record_story_view();
        Ok(count)
    }

    /// Delete a story on behalf of `actor`.
    ///
    /// The record is deleted first and the media object only after that
    /// succeeded: an orphaned media object is tolerable, a dangling record
    /// pointing at deleted media is not.
    pub async fn delete_story(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let story = self.store.get(id).await?;

        if !can_delete(&story, actor) {
            tracing::warn!(story_id = %id, actor = %actor.id, "unauthorized story delete rejected");
            return Err(AppError::PermissionDenied(
                "only the story's author or an admin may delete it".to_string(),
            ));
        }

        self.store.delete(id).await?;

        if let Err(e) = self.media.delete(&story.media_path).await {
            tracing::warn!(
                story_id = %id,
                media_path = %story.media_path,
                error = %e,
                "media delete failed after record delete, object orphaned"
            );
        }

        metrics::record_story_deleted("explicit");
        tracing::info!(story_id = %id, actor = %actor.id, admin = actor.is_admin, "story deleted");
        Ok(())
    }
}
