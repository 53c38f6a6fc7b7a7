//! Prometheus metrics for the expiration sweeper background job.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::time::Duration;

/// Total number of sweep cycles run (success/error)
static SWEEP_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "story_sweeper_runs_total",
        "Total number of expiration sweep cycles (success/error)",
        &["status"]
    )
    .expect("failed to register story_sweeper_runs_total")
});

/// Duration of sweep cycles
static SWEEP_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "story_sweeper_duration_seconds",
        "Duration of expiration sweep cycles",
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]
    )
    .expect("failed to register story_sweeper_duration_seconds")
});

/// Stories considered in the last sweep cycle
static STORIES_CHECKED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "story_sweeper_stories_checked",
        "Number of stories considered in the last sweep cycle"
    )
    .expect("failed to register story_sweeper_stories_checked")
});

pub fn record_sweep_run(status: &str) {
    SWEEP_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_sweep_duration(duration: Duration) {
    SWEEP_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn set_stories_checked(count: i64) {
    STORIES_CHECKED.set(count);
}
