//! Shared fixtures for story-service integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use story_service::clock::ManualClock;
use story_service::error::{AppError, Result};
use story_service::media::MemoryMediaStore;
use story_service::models::Story;
use story_service::playback::MediaPreloader;
use story_service::services::{NewStoryUpload, StoriesService};
use story_service::store::{MemoryStoryStore, StoryFilter, StoryStore, StorySubscription};
use story_service::identity::Actor;
use uuid::Uuid;

pub struct TestApp {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStoryStore>,
    pub media: Arc<MemoryMediaStore>,
    pub service: Arc<StoriesService>,
}

pub fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(MemoryStoryStore::new(clock.clone()));
    let media = Arc::new(MemoryMediaStore::new("http://localhost:8082/media"));
    let service = Arc::new(StoriesService::new(
        store.clone(),
        media.clone(),
        clock.clone(),
    ));
    TestApp {
        clock,
        store,
        media,
        service,
    }
}

pub fn image_upload() -> NewStoryUpload {
    NewStoryUpload {
        bytes: vec![0u8; 256],
        content_type: "image/jpeg".to_string(),
    }
}

pub fn visitor(id: &str) -> Actor {
    Actor::new(id, id, false)
}

pub fn admin() -> Actor {
    Actor::new("admin-1", "Admin", true)
}

/// Preloader whose latency and outcome the test controls.
pub struct StubPreloader {
    pub delay: Duration,
    pub fail: bool,
}

impl StubPreloader {
    pub fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

#[async_trait]
impl MediaPreloader for StubPreloader {
    async fn preload(&self, story: &Story) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            Err(AppError::Unavailable(format!(
                "stub preload failure for {}",
                story.media_url
            )))
        } else {
            Ok(())
        }
    }
}

/// A story store whose backend is down; every call fails as `Unavailable`.
pub struct UnavailableStore;

#[async_trait]
impl StoryStore for UnavailableStore {
    async fn put(&self, _story: Story) -> Result<()> {
        Err(AppError::Unavailable("backend down".to_string()))
    }

    async fn get(&self, _id: Uuid) -> Result<Story> {
        Err(AppError::Unavailable("backend down".to_string()))
    }

    async fn query_active(&self, _now: chrono::DateTime<Utc>) -> Result<Vec<Story>> {
        Err(AppError::Unavailable("backend down".to_string()))
    }

    async fn query_all(&self) -> Result<Vec<Story>> {
        Err(AppError::Unavailable("backend down".to_string()))
    }

    async fn delete(&self, _id: Uuid) -> Result<()> {
        Err(AppError::Unavailable("backend down".to_string()))
    }

    async fn add_view(&self, _id: Uuid, _viewer: &str) -> Result<usize> {
        Err(AppError::Unavailable("backend down".to_string()))
    }

    async fn subscribe(&self, _filter: StoryFilter) -> Result<StorySubscription> {
        Err(AppError::Unavailable("backend down".to_string()))
    }
}
