/// HTTP handlers for story endpoints
///
/// This module contains handlers for:
/// - Stories: publish, list, view tracking, owner/admin deletion
/// - Live snapshots: server-sent-events fan-out of the active story set
/// - The public single-story view, reachable without authentication
pub mod stories;

// Re-export handler functions at module level
pub use stories::{
    create_story, delete_story, get_public_story, list_all_stories, list_stories, stream_stories,
    track_story_view, StoriesHandlerState,
};
