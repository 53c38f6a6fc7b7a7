use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use story_service::clock::SystemClock;
use story_service::config::MediaBackend;
use story_service::handlers::{self, StoriesHandlerState};
use story_service::jobs::ExpirationSweeper;
use story_service::media::{MediaStore, MemoryMediaStore, S3MediaStore};
use story_service::services::StoriesService;
use story_service::store::MemoryStoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_summary(state: web::Data<StoriesHandlerState>) -> HttpResponse {
    match state.service.list_active().await {
        Ok(stories) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "story-service",
            "version": env!("CARGO_PKG_VERSION"),
            "active_stories": stories.len(),
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("story store unavailable: {}", e),
            "service": "story-service",
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match story_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting story-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let clock = Arc::new(SystemClock);

    // Media storage backend
    let media: Arc<dyn MediaStore> = match config.media.backend {
        MediaBackend::S3 => {
            let s3 = match S3MediaStore::connect(&config.media).await {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!("S3 media store initialization failed: {}", e);
                    eprintln!("ERROR: Failed to initialize S3 media store: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = s3.health_check().await {
                tracing::error!("S3 media store health check failed: {}", e);
                eprintln!("ERROR: S3 media store unreachable: {}", e);
                std::process::exit(1);
            }
            Arc::new(s3)
        }
        MediaBackend::Memory => {
            tracing::info!("Using in-process media store (development mode)");
            Arc::new(MemoryMediaStore::new(config.media.public_base_url.clone()))
        }
    };

    let store = Arc::new(MemoryStoryStore::new(clock.clone()));
    let service = Arc::new(StoriesService::new(store.clone(), media.clone(), clock.clone()));

    // The sweeper is owned here and started exactly once per process; UI
    // surfaces never spawn their own.
    let sweeper = Arc::new(ExpirationSweeper::new(
        store.clone(),
        media.clone(),
        clock.clone(),
        Duration::from_secs(config.stories.sweep_interval_secs),
    ));
    sweeper.start().await;

    let stories_state = web::Data::new(StoriesHandlerState {
        service: service.clone(),
        max_upload_bytes: config.media.max_upload_bytes,
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_origins = config.cors.allowed_origins.clone();

    // Create HTTP server
    let server = HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in cors_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(stories_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(story_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            // Public single-story view; resolved by global story id, no
            // authentication required.
            .route("/story/{story_id}", web::get().to(handlers::get_public_story))
            .service(
                web::scope("/api/v1/stories")
                    .route("/all", web::get().to(handlers::list_all_stories))
                    .route("/live", web::get().to(handlers::stream_stories))
                    .service(
                        web::resource("")
                            .route(web::post().to(handlers::create_story))
                            .route(web::get().to(handlers::list_stories)),
                    )
                    .route(
                        "/{story_id}/views",
                        web::post().to(handlers::track_story_view),
                    )
                    .service(
                        web::resource("/{story_id}")
                            .route(web::delete().to(handlers::delete_story)),
                    ),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        result = &mut server_task => match result {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        },
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            sweeper.stop().await;
            server_handle.stop(true).await;
            match server_task.await {
                Ok(result) => result,
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            }
        }
    };

    sweeper.stop().await;
    tracing::info!("story-service shutting down");

    result
}
