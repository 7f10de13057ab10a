//! packmate-api - HTTP API server for packmate

mod auth;
mod calendar;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use calendar::{CalendarClient, DEFAULT_CALENDAR_URL};
use packmate_assistant::{AssistantBridge, GeminiBackend};
use packmate_core::{defaults, GenerationBackend};
use packmate_db::Database;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    db: Database,
    /// Assistant bridge; absent when no generation backend is configured,
    /// in which case chat serves its fixed fallback reply.
    assistant: Option<Arc<AssistantBridge>>,
    calendar: CalendarClient,
}

// =============================================================================
// HEALTH
// =============================================================================

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "packmate-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// CORS
// =============================================================================

/// Parse `ALLOWED_ORIGINS` (comma-separated) into header values, dropping
/// anything unparseable with a warning. Defaults to localhost dev origins.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let raw = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "packmate_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "packmate_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("packmate-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/packmate".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::SERVER_PORT);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Generation backend is optional: without it the chat endpoint serves
    // the fixed fallback reply instead of refusing to start.
    let assistant = match GeminiBackend::from_env() {
        Ok(backend) => {
            info!("Generation backend initialized: {}", backend.model_name());
            Some(Arc::new(AssistantBridge::new(Arc::new(backend))))
        }
        Err(e) => {
            warn!("Assistant disabled: {}", e);
            None
        }
    };

    let calendar_url =
        std::env::var("CALENDAR_API_URL").unwrap_or_else(|_| DEFAULT_CALENDAR_URL.to_string());
    let calendar = CalendarClient::new(calendar_url);

    // Create app state
    let state = AppState {
        db,
        assistant,
        calendar,
    };

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Trips
        .route(
            "/api/v1/trips",
            get(handlers::trips::list_trips).post(handlers::trips::create_trip),
        )
        .route(
            "/api/v1/trips/:id",
            get(handlers::trips::trip_detail).delete(handlers::trips::delete_trip),
        )
        .route("/api/v1/trips/:id/share", post(handlers::trips::share_trip))
        .route(
            "/api/v1/trips/:id/categories",
            post(handlers::trips::add_category).delete(handlers::trips::remove_category),
        )
        // Packing items
        .route("/api/v1/trips/:id/items", post(handlers::items::add_items))
        .route(
            "/api/v1/items/:id/toggle",
            post(handlers::items::toggle_item),
        )
        .route("/api/v1/items/:id", delete(handlers::items::delete_item))
        // Private notes
        .route(
            "/api/v1/trips/:id/note",
            get(handlers::notes::get_note).post(handlers::notes::append_note),
        )
        // Assistant
        .route("/api/v1/trips/:id/chat", post(handlers::assistant::chat))
        .route(
            "/api/v1/trips/:id/chat/confirm",
            post(handlers::assistant::confirm),
        )
        .route(
            "/api/v1/trips/:id/chat/reset",
            post(handlers::assistant::reset),
        )
        // Calendar reminders
        .route(
            "/api/v1/trips/:id/reminder",
            post(handlers::assistant::reminder),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
