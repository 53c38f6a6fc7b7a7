/// Media storage collaborator
///
/// Story binaries live outside the story collection. The service only needs
/// two operations from whatever holds them: persist bytes under a path and
/// return a durable URL, and delete by path. Failures surface as
/// `AppError::Upload` / `AppError::MediaDelete`.
pub mod memory;
pub mod s3;

use crate::error::Result;
use async_trait::async_trait;

pub use memory::MemoryMediaStore;
pub use s3::S3MediaStore;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist `bytes` under `path` and return the durable public URL.
    async fn put(&self, bytes: Vec<u8>, path: &str, content_type: &str) -> Result<String>;

    /// Delete the object at `path`. Deleting an absent path is a no-op.
    async fn delete(&self, path: &str) -> Result<()>;
}
