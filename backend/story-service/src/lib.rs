/// Story Service Library
///
/// Ephemeral story subsystem for the gallery platform: stories are published
/// with a fixed 24 h lifetime, fanned out to live subscribers, view-tracked
/// per distinct viewer, and reclaimed by a background sweeper once expired.
/// The playback controller that presents a story sequence with exact timing
/// lives here as well, UI-framework independent.
///
/// # Modules
///
/// - `handlers`: Story HTTP request handlers, including the SSE fan-out
/// - `models`: The story entity and TTL arithmetic
/// - `services`: Business logic layer (publish, views, gated deletion)
/// - `store`: Document-collection contract and in-process realization
/// - `media`: Media storage collaborator (S3 and in-memory backends)
/// - `playback`: Timed, interruptible slideshow state machine
/// - `jobs`: Expiration sweeper background job
/// - `identity`: Actor extraction from gateway-injected headers
/// - `clock`: Injectable time source
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod jobs;
pub mod media;
pub mod metrics;
pub mod models;
pub mod playback;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
