/// Media preloading for playback.
///
/// Playback only marks a story as `Playing` once its media has passed a
/// preload check, so viewers never see a blank frame between stories. Over
/// HTTP that check is a ranged probe of the media URL; both images and
/// videos only need the object to be reachable and readable.
use crate::error::{AppError, Result};
use crate::models::Story;
use async_trait::async_trait;

#[async_trait]
pub trait MediaPreloader: Send + Sync {
    async fn preload(&self, story: &Story) -> Result<()>;
}

pub struct HttpPreloader {
    client: reqwest::Client,
}

impl HttpPreloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpPreloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaPreloader for HttpPreloader {
    async fn preload(&self, story: &Story) -> Result<()> {
        let response = self
            .client
            .get(&story.media_url)
            .header(reqwest::header::RANGE, "bytes=0-0")
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("media preload failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Unavailable(format!(
                "media preload returned status {}",
                response.status()
            )))
        }
    }
}
