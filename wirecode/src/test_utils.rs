//! Shared helpers for tests: in-memory databases, canned upstream bodies,
//! and fully wired test servers.

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::config::{AiConfig, Config};
use crate::limits::Limiters;
use crate::{AppState, build_router, migrator};

/// Fresh in-memory database with migrations applied.
///
/// A single connection keeps every handle on the same in-memory database;
/// additional connections would each see their own empty one.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    migrator().run(&pool).await.expect("Failed to run migrations");

    pool
}

/// Default configuration for tests, pointed at nothing in particular.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.ai = test_ai_config("http://127.0.0.1:1");
    config
}

/// AI configuration pointed at a mock upstream.
pub fn test_ai_config(base_url: &str) -> AiConfig {
    AiConfig {
        base_url: base_url.parse().expect("test base url is valid"),
        api_key: Some("test-key".to_string()),
        request_timeout: std::time::Duration::from_secs(5),
        ..AiConfig::default()
    }
}

/// Build an SSE response body in the upstream completion format.
pub fn sse_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        let event = serde_json::json!({"choices": [{"delta": {"content": chunk}}]});
        body.push_str(&format!("data: {event}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// Test server over the full router with an in-memory database.
pub async fn create_test_app() -> axum_test::TestServer {
    create_test_app_with(test_config()).await
}

/// Same as [`create_test_app`] but with a caller-provided configuration.
pub async fn create_test_app_with(config: Config) -> axum_test::TestServer {
    let pool = test_pool().await;

    let state = AppState::builder()
        .db(pool)
        .limits(Limiters::new(&config.limits))
        .config(config)
        .http(reqwest::Client::new())
        .build();

    let router = build_router(state);
    axum_test::TestServer::new(router).expect("Failed to create test server")
}
