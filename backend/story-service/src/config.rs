/// Configuration management for Story Service
///
/// This module handles loading and managing configuration from environment
/// variables.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Media storage configuration
    pub media: MediaConfig,
    /// Story lifecycle configuration
    pub stories: StoriesConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Media storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    /// In-process object store, for development and tests
    Memory,
    /// S3 (or S3-compatible) bucket
    S3,
}

/// Media storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible storage (MinIO etc.)
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Base URL under which uploaded objects are publicly reachable
    pub public_base_url: String,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

/// Story lifecycle configuration
///
/// The 24 h story TTL itself is a fixed constant (`models::STORY_TTL_HOURS`),
/// not configuration; only the sweeper cadence is tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoriesConfig {
    /// Expiration sweeper interval, in seconds
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("STORY_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("STORY_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8082),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if app_env.eq_ignore_ascii_case("production") && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            media: {
                let backend = match std::env::var("MEDIA_BACKEND").as_deref() {
                    Ok("s3") => MediaBackend::S3,
                    Ok("memory") | Err(_) => MediaBackend::Memory,
                    Ok(other) => {
                        return Err(format!("Unknown MEDIA_BACKEND '{}'", other));
                    }
                };

                if backend == MediaBackend::Memory && app_env.eq_ignore_ascii_case("production") {
                    return Err(
                        "MEDIA_BACKEND=memory is not allowed in production".to_string()
                    );
                }

                MediaConfig {
                    backend,
                    bucket: std::env::var("MEDIA_S3_BUCKET")
                        .unwrap_or_else(|_| "gallery-stories".to_string()),
                    region: std::env::var("MEDIA_S3_REGION")
                        .unwrap_or_else(|_| "eu-central-1".to_string()),
                    endpoint: std::env::var("MEDIA_S3_ENDPOINT").ok(),
                    access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                    secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                    public_base_url: std::env::var("MEDIA_PUBLIC_BASE_URL")
                        .unwrap_or_else(|_| "http://localhost:8082/media".to_string()),
                    max_upload_bytes: std::env::var("MEDIA_MAX_UPLOAD_BYTES")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(100 * 1024 * 1024),
                }
            },
            stories: StoriesConfig {
                sweep_interval_secs: std::env::var("STORY_SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
        })
    }
}
