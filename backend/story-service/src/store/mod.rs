/// Story persistence layer
///
/// `StoryStore` is the document-collection contract the rest of the service
/// is written against: point writes, point reads, filtered queries, deletes,
/// an atomic viewer set-add, and push-based subscriptions. Subscribers
/// receive the *full current matching set* on every effective change, never
/// a diff; each delivery replaces prior state.
pub mod memory;

use crate::error::Result;
use crate::models::Story;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

pub use memory::MemoryStoryStore;

/// Which slice of the collection a subscription observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryFilter {
    /// Stories whose expiration lies in the future (audience view).
    Active,
    /// Every story, expired or not (administrative view).
    All,
}

impl StoryFilter {
    pub fn matches(&self, story: &Story, now: DateTime<Utc>) -> bool {
        match self {
            StoryFilter::Active => !story.is_expired(now),
            StoryFilter::All => true,
        }
    }
}

/// Live query handle. Each received value is the complete matching set at
/// the time of the change that produced it. Dropping the handle
/// unsubscribes.
pub struct StorySubscription {
    rx: mpsc::UnboundedReceiver<Vec<Story>>,
}

impl StorySubscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Vec<Story>>) -> Self {
        Self { rx }
    }

    /// Next full snapshot, or `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Vec<Story>> {
        self.rx.recv().await
    }
}

/// Document-collection contract for stories.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Insert or replace a story record.
    async fn put(&self, story: Story) -> Result<()>;

    /// Fetch one story by id. Missing records are `AppError::NotFound`.
    async fn get(&self, id: Uuid) -> Result<Story>;

    /// Stories with `now < expires_at`, ordered by `created_at` (ties by id).
    async fn query_active(&self, now: DateTime<Utc>) -> Result<Vec<Story>>;

    /// Every story, expired or not, in the same ordering.
    async fn query_all(&self) -> Result<Vec<Story>>;

    /// Remove a record. Deleting an absent id is a no-op, not an error.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Atomically add `viewer` to the story's view set and return the
    /// unique-viewer count. Re-adding an existing viewer changes nothing.
    /// Concurrent adds from different viewers all survive.
    async fn add_view(&self, id: Uuid, viewer: &str) -> Result<usize>;

    /// Open a live query. The current matching set is delivered immediately,
    /// then again after every effective change.
    async fn subscribe(&self, filter: StoryFilter) -> Result<StorySubscription>;
}
