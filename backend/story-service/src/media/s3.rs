/// S3-backed media store for story binaries.
///
/// Uploads go to a single bucket under their story path; objects are public
/// through the configured base URL (typically a CDN in front of the bucket).
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use crate::media::MediaStore;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

pub struct S3MediaStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaStore {
    pub fn new(client: Client, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Initialize an AWS S3 client from media configuration.
    ///
    /// Explicit credentials are used when configured, otherwise the default
    /// credential chain. A custom endpoint supports S3-compatible storage
    /// like MinIO.
    pub async fn connect(config: &MediaConfig) -> Result<Self> {
        use aws_sdk_s3::config::Region;

        let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            use aws_sdk_s3::config::Credentials;

            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "story_service_media",
            );

            aws_config_builder = aws_config_builder.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            aws_config_builder = aws_config_builder.endpoint_url(endpoint);
        }

        let aws_config = aws_config_builder.load().await;
        let client = Client::new(&aws_config);

        Ok(Self::new(
            client,
            config.bucket.clone(),
            config.public_base_url.clone(),
        ))
    }

    /// Verify bucket connectivity and credentials at startup.
    pub async fn health_check(&self) -> Result<()> {
        match self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(1)
            .send()
            .await
        {
            Ok(_) => {
                tracing::info!(bucket = %self.bucket, "S3 media store connection validated");
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                tracing::error!(bucket = %self.bucket, error = %error_msg, "S3 health check failed");
                Err(AppError::Unavailable(format!(
                    "S3 health check failed: {}",
                    error_msg
                )))
            }
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn put(&self, bytes: Vec<u8>, path: &str, content_type: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            // Stories expire after 24 h; no long-lived caching.
            .cache_control("max-age=86400")
            .send()
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("403") || error_msg.contains("Forbidden") {
                    AppError::Upload("S3 auth failed (403): check AWS credentials".to_string())
                } else if error_msg.contains("NoSuchBucket") {
                    AppError::Upload(format!("S3 bucket not found: {}", self.bucket))
                } else {
                    AppError::Upload(format!("S3 upload failed: {}", e))
                }
            })?;

        Ok(self.public_url(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("403") || error_msg.contains("Forbidden") {
                    AppError::MediaDelete("S3 auth failed (403): check AWS credentials".to_string())
                } else {
                    AppError::MediaDelete(format!("S3 delete failed: {}", e))
                }
            })?;

        Ok(())
    }
}
