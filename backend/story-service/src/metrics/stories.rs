//! Prometheus metrics for the story lifecycle.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

static STORIES_PUBLISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "story_published_total",
        "Total stories published",
        &["media_type"]
    )
    .expect("failed to register story_published_total")
});

static STORY_VIEWS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("story_views_total", "Total story view marks recorded")
        .expect("failed to register story_views_total")
});

static STORIES_DELETED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "story_deleted_total",
        "Total stories deleted (explicit delete or expiration sweep)",
        &["reason"]
    )
    .expect("failed to register story_deleted_total")
});

pub fn record_story_published(media_type: &str) {
    STORIES_PUBLISHED_TOTAL
        .with_label_values(&[media_type])
        .inc();
}

pub fn record_story_view() {
    STORY_VIEWS_TOTAL.inc();
}

pub fn record_story_deleted(reason: &str) {
    STORIES_DELETED_TOTAL.with_label_values(&[reason]).inc();
}
