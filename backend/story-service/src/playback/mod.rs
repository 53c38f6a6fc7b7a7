/// Story playback controller
///
/// A state machine over `{Idle, Loading, Playing, Paused, Closed}` that
/// drives a timed, interruptible slideshow over the currently-active story
/// list. It consumes the live story subscription and the view tracker; it
/// owns nothing persistent, only ephemeral playback state (current index,
/// progress, pause accounting).
///
/// The controller runs as a tokio task. All mutable state lives inside that
/// task, so transitions are strictly sequential. A `PlaybackHandle` feeds it
/// user commands and exposes a `watch` stream of snapshots for rendering.
/// Progress is driven by a cancelable frame ticker against the monotonic
/// clock, never by wall-clock polling; pausing freezes the elapsed
/// accounting instead of restarting it.
///
/// Cancel paths: the ticker dies with the task, the pending preload is
/// aborted on every superseding transition and on close, and dropping the
/// handle aborts the whole task (unmount semantics).
pub mod preload;

use crate::models::Story;
use crate::services::StoriesService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use uuid::Uuid;

pub use preload::{HttpPreloader, MediaPreloader};

/// Per-story display time.
pub const DEFAULT_STORY_DURATION: Duration = Duration::from_millis(5000);

/// Progress ticker cadence, one frame at ~60 fps.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Closed,
}

#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// How long each story is displayed.
    pub story_duration: Duration,
    /// Upper bound on the preload gate; a slower preload degrades to
    /// playing without it rather than stalling playback.
    pub preload_timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            story_duration: DEFAULT_STORY_DURATION,
            preload_timeout: Duration::from_secs(10),
        }
    }
}

/// Renderable view of the controller. Each value replaces the previous one.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub index: usize,
    pub total: usize,
    /// 0–100 progress through the current story.
    pub progress: f64,
    pub current: Option<Story>,
}

impl PlaybackSnapshot {
    fn idle() -> Self {
        Self {
            state: PlaybackState::Idle,
            index: 0,
            total: 0,
            progress: 0.0,
            current: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Pause,
    Resume,
    TogglePause,
    Next,
    Previous,
    Close,
}

enum Event {
    Command(Command),
    List(Vec<Story>),
    SubscriptionEnded,
    PreloadDone { generation: u64 },
}

/// Caller-side handle to a running playback controller.
///
/// Dropping the handle aborts the controller task and everything it
/// scheduled; an unmounted viewer leaves no timers behind.
pub struct PlaybackHandle {
    events_tx: mpsc::UnboundedSender<Event>,
    snapshot_rx: watch::Receiver<PlaybackSnapshot>,
    task: JoinHandle<()>,
}

impl PlaybackHandle {
    pub fn pause(&self) {
        let _ = self.events_tx.send(Event::Command(Command::Pause));
    }

    pub fn resume(&self) {
        let _ = self.events_tx.send(Event::Command(Command::Resume));
    }

    pub fn toggle_pause(&self) {
        let _ = self.events_tx.send(Event::Command(Command::TogglePause));
    }

    /// Advance to the next story; past the last story this behaves like
    /// natural completion.
    pub fn next(&self) {
        let _ = self.events_tx.send(Event::Command(Command::Next));
    }

    /// Go back one story; a no-op at index 0.
    pub fn previous(&self) {
        let _ = self.events_tx.send(Event::Command(Command::Previous));
    }

    pub fn close(&self) {
        let _ = self.events_tx.send(Event::Command(Command::Close));
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch snapshots as they change.
    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait until the controller reaches `Closed`.
    pub async fn closed(&mut self) {
        loop {
            if self.snapshot_rx.borrow().state == PlaybackState::Closed {
                return;
            }
            if self.snapshot_rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Open a playback controller over the active story subscription, starting
/// at `initial_index`. The controller is `Idle` until the first snapshot
/// arrives; an empty snapshot or a failed subscription closes it.
pub fn open(
    service: Arc<StoriesService>,
    preloader: Arc<dyn MediaPreloader>,
    viewer_id: impl Into<String>,
    initial_index: usize,
    config: PlaybackConfig,
) -> PlaybackHandle {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::idle());

    let controller = Controller {
        service,
        preloader,
        viewer_id: viewer_id.into(),
        config,
        initial_index,
        stories: Vec::new(),
        index: 0,
        state: PlaybackState::Idle,
        progress: 0.0,
        started_at: None,
        paused_at: None,
        paused_total: Duration::ZERO,
        generation: 0,
        last_marked: None,
        preload_task: None,
        subscription_task: None,
        events_tx: events_tx.clone(),
        snapshot_tx,
    };

    let task = tokio::spawn(controller.run(events_rx));

    PlaybackHandle {
        events_tx,
        snapshot_rx,
        task,
    }
}

struct Controller {
    service: Arc<StoriesService>,
    preloader: Arc<dyn MediaPreloader>,
    viewer_id: String,
    config: PlaybackConfig,
    initial_index: usize,

    stories: Vec<Story>,
    index: usize,
    state: PlaybackState,
    progress: f64,

    /// When the current story entered `Playing`.
    started_at: Option<Instant>,
    /// When the current pause began, while `Paused`.
    paused_at: Option<Instant>,
    /// Completed pause time for the current story; subtracted from elapsed
    /// time so unpausing resumes instead of restarting.
    paused_total: Duration,

    /// Invalidates in-flight preloads from superseded transitions.
    generation: u64,
    /// Story whose view was already recorded for this entry.
    last_marked: Option<Uuid>,

    preload_task: Option<JoinHandle<()>>,
    subscription_task: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<Event>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl Controller {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        match self.service.subscribe_active().await {
            Ok(mut subscription) => {
                let tx = self.events_tx.clone();
                self.subscription_task = Some(tokio::spawn(async move {
                    while let Some(list) = subscription.next().await {
                        if tx.send(Event::List(list)).is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(Event::SubscriptionEnded);
                }));
            }
            Err(e) => {
                tracing::warn!(error = %e, "story subscription unavailable, closing playback");
                self.close();
                self.publish();
                return;
            }
        }

        let mut ticker = interval(FRAME_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => self.close(),
                },
                _ = ticker.tick(), if self.state == PlaybackState::Playing => {
                    self.on_tick();
                }
            }

            self.publish();
            if self.state == PlaybackState::Closed {
                break;
            }
        }

        if let Some(task) = self.subscription_task.take() {
            task.abort();
        }
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Command(command) => self.on_command(command),
            Event::List(list) => self.on_list(list),
            Event::SubscriptionEnded => self.close(),
            Event::PreloadDone { generation } => {
                if self.state == PlaybackState::Loading && generation == self.generation {
                    self.enter_playing();
                }
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Pause => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                    self.paused_at = Some(Instant::now());
                }
            }
            Command::Resume => self.resume(),
            Command::TogglePause => match self.state {
                PlaybackState::Playing => {
                    self.state = PlaybackState::Paused;
                    self.paused_at = Some(Instant::now());
                }
                PlaybackState::Paused => self.resume(),
                _ => {}
            },
            Command::Next => {
                if self.displaying() {
                    self.advance();
                }
            }
            Command::Previous => {
                // Navigating before the first story is a no-op.
                if self.displaying() && self.index > 0 {
                    self.index -= 1;
                    self.enter_loading();
                }
            }
            Command::Close => self.close(),
        }
    }

    fn displaying(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
        )
    }

    fn resume(&mut self) {
        if self.state != PlaybackState::Paused {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
        }
        self.state = PlaybackState::Playing;
    }

    /// Next story, or natural completion after the last one.
    fn advance(&mut self) {
        if self.index + 1 < self.stories.len() {
            self.index += 1;
            self.enter_loading();
        } else {
            self.close();
        }
    }

    fn on_tick(&mut self) {
        let Some(started_at) = self.started_at else {
            return;
        };
        let elapsed = started_at.elapsed().saturating_sub(self.paused_total);
        let ratio = elapsed.as_secs_f64() / self.config.story_duration.as_secs_f64();
        self.progress = (ratio * 100.0).min(100.0);

        if self.progress >= 100.0 {
            self.advance();
        }
    }

    fn on_list(&mut self, list: Vec<Story>) {
        match self.state {
            PlaybackState::Idle => {
                self.stories = list;
                if self.stories.is_empty() {
                    self.close();
                    return;
                }
                self.index = self.initial_index.min(self.stories.len() - 1);
                self.enter_loading();
            }
            PlaybackState::Closed => {}
            _ => {
                let current_id = self.stories.get(self.index).map(|s| s.id);
                self.stories = list;
                if self.stories.is_empty() {
                    self.close();
                    return;
                }
                match current_id.and_then(|id| self.stories.iter().position(|s| s.id == id)) {
                    // The displayed story survived the change (a view-count
                    // update, or other stories coming and going); keep its
                    // progress and just re-anchor the index.
                    Some(position) => self.index = position,
                    // The displayed story was deleted out from under us:
                    // fall through to whatever shifted into its slot.
                    None => {
                        self.index = self.index.min(self.stories.len() - 1);
                        self.enter_loading();
                    }
                }
            }
        }
    }

    /// Begin loading the story at `self.index`: reset progress, start the
    /// preload gate, and invalidate any superseded preload.
    fn enter_loading(&mut self) {
        self.cancel_preload();
        self.state = PlaybackState::Loading;
        self.progress = 0.0;
        self.started_at = None;
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.generation += 1;

        let story = self.stories[self.index].clone();
        let generation = self.generation;
        let preloader = Arc::clone(&self.preloader);
        let timeout = self.config.preload_timeout;
        let tx = self.events_tx.clone();

        self.preload_task = Some(tokio::spawn(async move {
            match tokio::time::timeout(timeout, preloader.preload(&story)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(story_id = %story.id, error = %e, "story preload failed, playing anyway");
                }
                Err(_) => {
                    tracing::warn!(story_id = %story.id, "story preload timed out, playing anyway");
                }
            }
            let _ = tx.send(Event::PreloadDone { generation });
        }));
    }

    fn enter_playing(&mut self) {
        self.preload_task = None;
        self.state = PlaybackState::Playing;
        self.started_at = Some(Instant::now());
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.progress = 0.0;

        // Record the view once per story-entry; the store-level set-add
        // keeps repeats harmless anyway.
        let story = &self.stories[self.index];
        if self.last_marked != Some(story.id) {
            self.last_marked = Some(story.id);
            let service = Arc::clone(&self.service);
            let id = story.id;
            let viewer = self.viewer_id.clone();
            tokio::spawn(async move {
                if let Err(e) = service.mark_viewed(id, &viewer).await {
                    tracing::warn!(story_id = %id, error = %e, "failed to record story view");
                }
            });
        }
    }

    fn close(&mut self) {
        if self.state == PlaybackState::Closed {
            return;
        }
        self.cancel_preload();
        self.state = PlaybackState::Closed;
    }

    fn cancel_preload(&mut self) {
        if let Some(task) = self.preload_task.take() {
            task.abort();
        }
    }

    fn publish(&self) {
        let current = if self.displaying() {
            self.stories.get(self.index).cloned()
        } else {
            None
        };
        let _ = self.snapshot_tx.send(PlaybackSnapshot {
            state: self.state,
            index: self.index,
            total: self.stories.len(),
            progress: self.progress,
            current,
        });
    }
}
