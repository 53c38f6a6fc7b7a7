/// Background jobs for story-service
pub mod story_sweeper;

pub use story_sweeper::{ExpirationSweeper, SweepOutcome};
