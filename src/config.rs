use crate::schemas::AppState;
use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default CORS origins always present in the allow-list; the
/// CORS_ORIGINS env var appends a comma-separated set on top.
const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

/// All environment-driven settings, loaded once and injected through
/// `AppState` rather than read ad hoc by handlers.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Full CORS allow-list (defaults + CORS_ORIGINS).
    pub cors_origins: Vec<String>,
    /// External image-hosting service; uploads are disabled when unset.
    pub image_service_url: Option<String>,
    pub image_service_key: Option<String>,
}

impl AppConfig {
    /// Load configuration from the environment, layering a `.env` file
    /// underneath the process environment when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut cors_origins: Vec<String> = DEFAULT_CORS_ORIGINS
            .iter()
            .map(|origin| (*origin).to_string())
            .collect();
        if let Ok(extra) = std::env::var("CORS_ORIGINS") {
            for origin in extra.split(',') {
                let origin = origin.trim();
                if !origin.is_empty() && !cors_origins.iter().any(|o| o == origin) {
                    cors_origins.push(origin.to_string());
                }
            }
        }

        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://saleflow.db".to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "saleflow-dev-secret".to_string()),
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            cors_origins,
            image_service_url: std::env::var("IMAGE_SERVICE_URL").ok(),
            image_service_key: std::env::var("IMAGE_SERVICE_KEY").ok(),
        }
    }
}

/// Initialize application state with an explicit database URL,
/// overriding whatever the environment says (used by the CLI).
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    let config = AppConfig::from_env();
    build_app_state(config, database_url).await
}

async fn build_app_state(config: AppConfig, database_url: &str) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    // Cache for analytics responses
    let cache = Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(300)) // 5 minutes
        .build();

    Ok(AppState {
        db,
        config: Arc::new(config),
        cache,
    })
}
