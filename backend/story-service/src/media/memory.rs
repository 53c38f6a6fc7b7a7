/// In-process media store for development and tests.
use crate::error::Result;
use crate::media::MediaStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

pub struct MemoryMediaStore {
    public_base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryMediaStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored objects. Test support.
    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects.lock().await.contains_key(path)
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn put(&self, bytes: Vec<u8>, path: &str, content_type: &str) -> Result<String> {
        let mut objects = self.objects.lock().await;
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            path
        ))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects.lock().await.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_returns_url_under_public_base() {
        let store = MemoryMediaStore::new("http://localhost:8082/media/");
        let url = store
            .put(vec![1, 2, 3], "stories/a.jpg", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8082/media/stories/a.jpg");
        assert!(store.contains("stories/a.jpg").await);

        let stored = store.objects.lock().await;
        let object = stored.get("stories/a.jpg").unwrap();
        assert_eq!(object.bytes, vec![1, 2, 3]);
        assert_eq!(object.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryMediaStore::new("http://localhost:8082/media");
        store
            .put(vec![0u8; 8], "stories/b.mp4", "video/mp4")
            .await
            .unwrap();

        store.delete("stories/b.mp4").await.unwrap();
        store.delete("stories/b.mp4").await.unwrap();
        assert_eq!(store.object_count().await, 0);
    }
}
