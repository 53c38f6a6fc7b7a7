/// Business logic layer for story-service
///
/// One service owns the story lifecycle: publishing, queries, live
/// subscriptions, view tracking, and owner/admin-gated deletion.
pub mod stories;

pub use stories::{can_delete, NewStoryUpload, StoriesService};
