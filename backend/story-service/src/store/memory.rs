/// In-process realization of the `StoryStore` contract.
///
/// One global map keyed by story id backs every query, including the public
/// single-story lookup; there is no per-owner partitioning. All mutations
/// and the snapshot fan-out happen inside a single critical section, which
/// is what makes `add_view` an atomic set-add rather than a read-modify-write
/// of a stale copy.
use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::Story;
use crate::store::{StoryFilter, StoryStore, StorySubscription};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

struct Subscriber {
    filter: StoryFilter,
    tx: mpsc::UnboundedSender<Vec<Story>>,
}

struct Inner {
    stories: HashMap<Uuid, Story>,
    subscribers: Vec<Subscriber>,
}

pub struct MemoryStoryStore {
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl MemoryStoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner {
                stories: HashMap::new(),
                subscribers: Vec::new(),
            }),
        }
    }
}

fn snapshot(stories: &HashMap<Uuid, Story>, filter: StoryFilter, now: DateTime<Utc>) -> Vec<Story> {
    let mut matching: Vec<Story> = stories
        .values()
        .filter(|s| filter.matches(s, now))
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    matching
}

impl Inner {
    /// Push the current matching set to every live subscriber. Subscribers
    /// whose receiver is gone are pruned here.
    fn notify(&mut self, now: DateTime<Utc>) {
        let stories = &self.stories;
        self.subscribers.retain(|sub| {
            let set = snapshot(stories, sub.filter, now);
            sub.tx.send(set).is_ok()
        });
    }
}

#[async_trait]
impl StoryStore for MemoryStoryStore {
    async fn put(&self, story: Story) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.stories.insert(story.id, story);
        inner.notify(self.clock.now());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Story> {
        let inner = self.inner.lock().await;
        inner
            .stories
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("story {}", id)))
    }

    async fn query_active(&self, now: DateTime<Utc>) -> Result<Vec<Story>> {
        let inner = self.inner.lock().await;
        Ok(snapshot(&inner.stories, StoryFilter::Active, now))
    }

    async fn query_all(&self) -> Result<Vec<Story>> {
        let inner = self.inner.lock().await;
        Ok(snapshot(
            &inner.stories,
            StoryFilter::All,
            self.clock.now(),
        ))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.stories.remove(&id).is_some() {
            inner.notify(self.clock.now());
        }
        Ok(())
    }

    async fn add_view(&self, id: Uuid, viewer: &str) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        let (count, changed) = {
            let story = inner
                .stories
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound(format!("story {}", id)))?;
            let changed = story.views.insert(viewer.to_string());
            (story.views.len(), changed)
        };
        if changed {
            inner.notify(self.clock.now());
        }
        Ok(count)
    }

    async fn subscribe(&self, filter: StoryFilter) -> Result<StorySubscription> {
        let mut inner = self.inner.lock().await;
        let (tx, rx) = mpsc::unbounded_channel();
        // Initial delivery: subscribers start from the current matching set.
        let _ = tx.send(snapshot(&inner.stories, filter, self.clock.now()));
        inner.subscribers.push(Subscriber { filter, tx });
        Ok(StorySubscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{story_ttl, MediaType};
    use chrono::Duration;
    use std::collections::BTreeSet;

    fn test_store() -> (Arc<ManualClock>, MemoryStoryStore) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = MemoryStoryStore::new(clock.clone());
        (clock, store)
    }

    fn story(clock: &ManualClock, author: &str) -> Story {
        let now = clock.now();
        Story {
            id: Uuid::new_v4(),
            author_id: author.to_string(),
            author_name: author.to_string(),
            media_url: format!("http://localhost/media/stories/{}.jpg", author),
            media_path: format!("stories/{}.jpg", author),
            media_type: MediaType::Image,
            created_at: now,
            expires_at: now + story_ttl(),
            views: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn active_query_excludes_expired_records() {
        let (clock, store) = test_store();
        let s = story(&clock, "anna");
        store.put(s.clone()).await.unwrap();

        let active = store.query_active(clock.now()).await.unwrap();
        assert_eq!(active.len(), 1);

        clock.advance(story_ttl());
        let active = store.query_active(clock.now()).await.unwrap();
        assert!(active.is_empty());
        // The record itself is still there until the sweeper reclaims it.
        assert_eq!(store.query_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn query_orders_by_creation_time() {
        let (clock, store) = test_store();
        let first = story(&clock, "anna");
        clock.advance(Duration::minutes(5));
        let second = story(&clock, "ben");
        store.put(second.clone()).await.unwrap();
        store.put(first.clone()).await.unwrap();

        let all = store.query_all().await.unwrap();
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[tokio::test]
    async fn delete_of_absent_id_is_a_noop() {
        let (_clock, store) = test_store();
        store.delete(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn add_view_is_idempotent() {
        let (clock, store) = test_store();
        let s = story(&clock, "anna");
        let id = s.id;
        store.put(s).await.unwrap();

        assert_eq!(store.add_view(id, "viewer-b").await.unwrap(), 1);
        assert_eq!(store.add_view(id, "viewer-b").await.unwrap(), 1);
        assert_eq!(store.add_view(id, "viewer-c").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn add_view_on_missing_story_is_not_found() {
        let (_clock, store) = test_store();
        let err = store.add_view(Uuid::new_v4(), "viewer-b").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn subscription_receives_full_snapshots() {
        let (clock, store) = test_store();
        let mut sub = store.subscribe(StoryFilter::Active).await.unwrap();

        // Initial delivery is the (empty) current set.
        assert_eq!(sub.next().await.unwrap(), Vec::<Story>::new());

        let s = story(&clock, "anna");
        let id = s.id;
        store.put(s).await.unwrap();
        assert_eq!(sub.next().await.unwrap().len(), 1);

        // A view update is an effective change and re-delivers the set.
        store.add_view(id, "viewer-b").await.unwrap();
        let snap = sub.next().await.unwrap();
        assert_eq!(snap[0].view_count(), 1);

        store.delete(id).await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ineffective_changes_push_nothing() {
        let (clock, store) = test_store();
        let s = story(&clock, "anna");
        let id = s.id;
        store.put(s).await.unwrap();

        let mut sub = store.subscribe(StoryFilter::All).await.unwrap();
        let _ = sub.next().await.unwrap();

        store.add_view(id, "viewer-b").await.unwrap();
        let _ = sub.next().await.unwrap();

        // Duplicate view and absent-id delete change nothing.
        store.add_view(id, "viewer-b").await.unwrap();
        store.delete(Uuid::new_v4()).await.unwrap();

        store.delete(id).await.unwrap();
        // The next delivery is the delete, not a duplicate-view echo.
        assert!(sub.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_filter_still_sees_expired_records() {
        let (clock, store) = test_store();
        store.put(story(&clock, "anna")).await.unwrap();
        clock.advance(story_ttl() + Duration::minutes(1));

        let mut all_sub = store.subscribe(StoryFilter::All).await.unwrap();
        let mut active_sub = store.subscribe(StoryFilter::Active).await.unwrap();

        assert_eq!(all_sub.next().await.unwrap().len(), 1);
        assert!(active_sub.next().await.unwrap().is_empty());
    }
}
