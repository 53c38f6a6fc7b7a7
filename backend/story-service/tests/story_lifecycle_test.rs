//! Integration tests: story lifecycle
//!
//! Covers the full publish → active → expired → swept path and the
//! view-tracking set semantics, against the in-process store with a manual
//! clock.

mod common;

use chrono::Duration;
use common::{admin, image_upload, test_app, visitor};
use story_service::error::AppError;
use story_service::store::StoryStore;
use story_service::jobs::ExpirationSweeper;
use story_service::models::STORY_TTL_HOURS;

fn sweeper(app: &common::TestApp) -> ExpirationSweeper {
    ExpirationSweeper::new(
        app.store.clone(),
        app.media.clone(),
        app.clock.clone(),
        std::time::Duration::from_secs(60),
    )
}

#[tokio::test]
async fn published_story_expires_exactly_one_ttl_after_creation() {
    let app = test_app();
    let story = app
        .service
        .publish(image_upload(), &visitor("maria"))
        .await
        .unwrap();

    assert_eq!(
        story.expires_at,
        story.created_at + Duration::hours(STORY_TTL_HOURS)
    );
}

#[tokio::test]
async fn story_lives_for_its_full_window_and_is_then_reclaimed() {
    let app = test_app();
    let story = app
        .service
        .publish(image_upload(), &visitor("maria"))
        .await
        .unwrap();

    // Still active one minute before the deadline.
    app.clock
        .advance(Duration::hours(23) + Duration::minutes(59));
    let active = app.service.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, story.id);

    // Two minutes later the deadline has passed: invisible to readers even
    // before the sweeper runs.
    app.clock.advance(Duration::minutes(2));
    assert!(app.service.list_active().await.unwrap().is_empty());

    // The sweep reclaims record and media.
    let outcome = sweeper(&app).sweep_once().await;
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.failed, 0);

    let err = app.service.get_public(story.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(app.media.object_count().await, 0);
}

#[tokio::test]
async fn marking_a_view_twice_counts_once() {
    let app = test_app();
    let story = app
        .service
        .publish(image_upload(), &visitor("maria"))
        .await
        .unwrap();

    let first = app.service.mark_viewed(story.id, "viewer-b").await.unwrap();
    let second = app.service.mark_viewed(story.id, "viewer-b").await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 1);
}

#[tokio::test]
async fn concurrent_viewers_converge_to_the_union() {
    let app = test_app();
    let story = app
        .service
        .publish(image_upload(), &visitor("maria"))
        .await
        .unwrap();

    // Two viewers race on the same story from separate tasks; the
    // store-level set-add must keep both contributions regardless of
    // interleaving.
    let mut tasks = Vec::new();
    for viewer in ["viewer-b", "viewer-c"] {
        let service = app.service.clone();
        let id = story.id;
        tasks.push(tokio::spawn(async move {
            for _ in 0..25 {
                service.mark_viewed(id, viewer).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stored = app.store.get(story.id).await.unwrap();
    assert_eq!(stored.view_count(), 2);
    assert!(stored.views.contains("viewer-b"));
    assert!(stored.views.contains("viewer-c"));
}

#[tokio::test]
async fn admin_delete_works_on_other_peoples_stories() {
    let app = test_app();
    let story = app
        .service
        .publish(image_upload(), &visitor("maria"))
        .await
        .unwrap();

    app.service.delete_story(story.id, &admin()).await.unwrap();
    assert!(app.service.get_public(story.id).await.is_err());
}

#[tokio::test]
async fn views_survive_only_while_the_story_does() {
    let app = test_app();
    let story = app
        .service
        .publish(image_upload(), &visitor("maria"))
        .await
        .unwrap();
    app.service.mark_viewed(story.id, "viewer-b").await.unwrap();

    app.clock
        .advance(Duration::hours(STORY_TTL_HOURS) + Duration::minutes(1));
    sweeper(&app).sweep_once().await;

    let err = app
        .service
        .mark_viewed(story.id, "viewer-c")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
