//! Expiration Sweeper Background Job
//!
//! Stories carry a fixed 24 h TTL. Read paths already filter on
//! `expires_at`, so expired records are invisible the moment their deadline
//! passes; this job reclaims the storage behind them: the media object
//! first, then the record.
//!
//! The sweeper is a process-scoped owned resource. `main` starts it exactly
//! once and stops it on shutdown; nothing else spawns it. Each cycle is
//! idempotent and safe to run concurrently with itself, since deleting an
//! already-deleted id is a no-op.

use crate::clock::Clock;
use crate::media::MediaStore;
use crate::metrics::{stories as story_metrics, sweeper as metrics};
use crate::store::StoryStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Default interval between sweep cycles.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// What a single sweep cycle did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Expired stories fully reclaimed (media and record).
    pub deleted: usize,
    /// Expired stories whose reclamation failed and will be retried.
    pub failed: usize,
}

pub struct ExpirationSweeper {
    store: Arc<dyn StoryStore>,
    media: Arc<dyn MediaStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ExpirationSweeper {
    pub fn new(
        store: Arc<dyn StoryStore>,
        media: Arc<dyn MediaStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            media,
            clock,
            interval,
            handle: Mutex::new(None),
        }
    }

    /// Start the periodic sweep loop. Starting an already-running sweeper is
    /// a no-op; the process owns exactly one loop.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            tracing::warn!("expiration sweeper already running, ignoring start");
            return;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "starting expiration sweeper"
        );

        let sweeper = Arc::clone(self);
        *handle = Some(tokio::spawn(async move {
            loop {
                sleep(sweeper.interval).await;

                let cycle_start = Instant::now();
                let outcome = sweeper.sweep_once().await;
                metrics::record_sweep_duration(cycle_start.elapsed());

                if outcome.failed > 0 {
                    metrics::record_sweep_run("error");
                    tracing::warn!(
                        deleted = outcome.deleted,
                        failed = outcome.failed,
                        "sweep cycle completed with failures"
                    );
                } else {
                    metrics::record_sweep_run("success");
                    if outcome.deleted > 0 {
                        tracing::info!(deleted = outcome.deleted, "sweep cycle reclaimed stories");
                    }
                }
            }
        }));
    }

    /// Cancel the sweep loop. Safe to call when not running.
    pub async fn stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
            tracing::info!("expiration sweeper stopped");
        }
    }

    /// Run one sweep cycle: reclaim every story whose expiration has passed.
    ///
    /// Per-item failures are logged and skipped so a single stuck record
    /// never blocks cleanup of the rest; the skipped pair is retried on the
    /// next cycle. A story with `now < expires_at` is never touched.
    pub async fn sweep_once(&self) -> SweepOutcome {
        let stories = match self.store.query_all().await {
            Ok(stories) => stories,
            Err(e) => {
                tracing::warn!(error = %e, "sweep skipped, story query failed");
                return SweepOutcome {
                    deleted: 0,
                    failed: 1,
                };
            }
        };

        metrics::set_stories_checked(stories.len() as i64);

        let now = self.clock.now();
        let mut outcome = SweepOutcome::default();

        for story in stories.iter().filter(|s| s.is_expired(now)) {
            // Media first; if that fails the record stays so the next cycle
            // retries the pair. The expired record is already invisible to
            // every read path.
            if let Err(e) = self.media.delete(&story.media_path).await {
                tracing::warn!(
                    story_id = %story.id,
                    media_path = %story.media_path,
                    error = %e,
                    "sweep: media delete failed, will retry next cycle"
                );
                outcome.failed += 1;
                continue;
            }

            if let Err(e) = self.store.delete(story.id).await {
                tracing::warn!(
                    story_id = %story.id,
                    error = %e,
                    "sweep: record delete failed, will retry next cycle"
                );
                outcome.failed += 1;
                continue;
            }

            story_metrics::record_story_deleted("expired");
            tracing::debug!(story_id = %story.id, "sweep: expired story reclaimed");
            outcome.deleted += 1;
        }

        outcome
    }
}

impl Drop for ExpirationSweeper {
    fn drop(&mut self) {
        if let Ok(mut handle) = self.handle.try_lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }
}
