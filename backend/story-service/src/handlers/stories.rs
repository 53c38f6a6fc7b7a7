/// Story handlers - HTTP endpoints for story operations
use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::services::{NewStoryUpload, StoriesService};
use crate::store::StorySubscription;
use actix_web::{web, HttpResponse};
use actix_multipart::Multipart;
use futures::{Stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Shared state for the story handlers.
pub struct StoriesHandlerState {
    pub service: Arc<StoriesService>,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize)]
pub struct StreamParams {
    /// `active` (default) or `all` (admin only).
    pub scope: Option<String>,
}

/// Read the uploaded media out of a multipart request.
///
/// Exactly one `file` field is expected; its MIME type decides whether the
/// story is an image or a video.
async fn read_upload(
    mut payload: Multipart,
    max_upload_bytes: usize,
) -> Result<NewStoryUpload> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .ok_or_else(|| AppError::BadRequest("upload is missing a content type".to_string()))?;

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("upload read failed: {}", e)))?;
            if bytes.len() + chunk.len() > max_upload_bytes {
                return Err(AppError::BadRequest(format!(
                    "upload exceeds the {} byte limit",
                    max_upload_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".to_string()));
        }

        return Ok(NewStoryUpload {
            bytes,
            content_type,
        });
    }

    Err(AppError::BadRequest(
        "multipart payload is missing a 'file' field".to_string(),
    ))
}

/// Publish a new story
pub async fn create_story(
    state: web::Data<StoriesHandlerState>,
    actor: Actor,
    payload: Multipart,
) -> Result<HttpResponse> {
    let upload = read_upload(payload, state.max_upload_bytes).await?;
    let story = state.service.publish(upload, &actor).await?;

    Ok(HttpResponse::Created().json(story))
}

/// Active stories for the calling audience
pub async fn list_stories(
    state: web::Data<StoriesHandlerState>,
    _actor: Actor,
) -> Result<HttpResponse> {
    let stories = state.service.list_active().await?;
    Ok(HttpResponse::Ok().json(stories))
}

/// Every story, expired included. Administrative view.
pub async fn list_all_stories(
    state: web::Data<StoriesHandlerState>,
    actor: Actor,
) -> Result<HttpResponse> {
    let stories = state.service.list_all(&actor).await?;
    Ok(HttpResponse::Ok().json(stories))
}

/// Track a story view for the calling viewer. Idempotent.
pub async fn track_story_view(
    state: web::Data<StoriesHandlerState>,
    story_id: web::Path<Uuid>,
    actor: Actor,
) -> Result<HttpResponse> {
    let views = state.service.mark_viewed(*story_id, &actor.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "views": views })))
}

/// Delete a story. Permitted for the author and for admins.
pub async fn delete_story(
    state: web::Data<StoriesHandlerState>,
    story_id: web::Path<Uuid>,
    actor: Actor,
) -> Result<HttpResponse> {
    state.service.delete_story(*story_id, &actor).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Public single-story view, addressed by global story id alone.
///
/// Missing and expired stories both answer with the not-found state; this
/// route never requires authentication.
pub async fn get_public_story(
    state: web::Data<StoriesHandlerState>,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let story = state.service.get_public(*story_id).await?;
    Ok(HttpResponse::Ok().json(story))
}

/// Live story snapshots as server-sent events.
///
/// Every frame carries the full current result set, replacing the previous
/// one. A failing backend degrades to a `notice` event plus an empty set
/// instead of breaking the stream consumer.
pub async fn stream_stories(
    state: web::Data<StoriesHandlerState>,
    actor: Actor,
    params: web::Query<StreamParams>,
) -> HttpResponse {
    let subscription = match params.scope.as_deref() {
        Some("all") => state.service.subscribe_all(&actor).await,
        Some("active") | None => state.service.subscribe_active().await,
        Some(other) => Err(AppError::BadRequest(format!(
            "unknown stream scope '{}'",
            other
        ))),
    };

    match subscription {
        Ok(subscription) => HttpResponse::Ok()
            .content_type("text/event-stream")
            .insert_header(("cache-control", "no-cache"))
            .streaming(snapshot_stream(subscription)),
        Err(e) => {
            tracing::warn!(error = %e, "story stream degraded to empty snapshot");
            let notice = serde_json::json!({ "error": e.to_string() }).to_string();
            let frame = format!("event: notice\ndata: {}\n\ndata: []\n\n", notice);
            HttpResponse::Ok()
                .content_type("text/event-stream")
                .insert_header(("cache-control", "no-cache"))
                .streaming(futures::stream::once(async move {
                    Ok::<_, actix_web::Error>(web::Bytes::from(frame))
                }))
        }
    }
}

fn snapshot_stream(
    subscription: StorySubscription,
) -> impl Stream<Item = std::result::Result<web::Bytes, actix_web::Error>> {
    futures::stream::unfold(subscription, |mut subscription| async move {
        let snapshot = subscription.next().await?;
        let payload = serde_json::to_string(&snapshot).unwrap_or_else(|_| "[]".to_string());
        let frame = web::Bytes::from(format!("data: {}\n\n", payload));
        Some((Ok(frame), subscription))
    })
}
