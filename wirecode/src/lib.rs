//! # wirecode: Wireframe-to-Code Generation Service
//!
//! `wirecode` turns UI wireframe images into working React components. A
//! client uploads a wireframe screenshot somewhere durable, then creates a
//! record here with the image URL, a text description, and a model choice;
//! the service streams AI-generated code back and persists the final result
//! on the record.
//!
//! ## Overview
//!
//! The service sits between a front-end client and an OpenAI-compatible
//! completion API (OpenRouter by default). Every generation is gated by a
//! per-user credit balance: new users get a small starting grant, each
//! wireframe creation debits the generation cost atomically, and an
//! exhausted balance blocks creation with `402 Payment Required`.
//!
//! ### Request Flow
//!
//! Creating a wireframe (`POST /api/v1/wireframes`) validates the payload,
//! consults the creation rate-limit policy point, inserts the record, and
//! debits the owner's balance in one transaction. The client then either
//! streams code statelessly (`POST /api/v1/generate`) and saves it back
//! (`PUT /api/v1/wireframes/{uid}/code`), or asks the server to run the
//! whole attempt (`POST /api/v1/wireframes/{uid}/regenerate`). Generated
//! code can be downloaded as a `.jsx`/`.tsx` file via the export endpoint.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the REST surface at `/api/v1/*` and
//! owns input validation and the HTTP error taxonomy. The **database
//! layer** ([`db`]) uses the repository pattern over SQLite. The
//! **generation layer** ([`generation`]) holds the model catalog, the SSE
//! stream client with its fence-stripping cleaner, and the orchestrator
//! that drives a full generate-then-persist attempt. Caller identity comes
//! from a trusted fronting proxy ([`auth`]); per-action rate limit policy
//! points live in [`limits`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use wirecode::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = wirecode::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     wirecode::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod generation;
pub mod limits;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Router,
    routing::{get, post, put},
};
use bon::Builder;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use types::{UserId, WireframeId};

use crate::limits::Limiters;
use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Shared HTTP client for upstream AI calls (connection pooling)
    pub http: reqwest::Client,
    pub limits: Limiters,
}

/// Get the wirecode database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/users", post(api::handlers::users::ensure_user).get(api::handlers::users::get_user))
        .route("/users/{email}/credits", post(api::handlers::users::add_credits))
        .route(
            "/wireframes",
            post(api::handlers::wireframes::create_wireframe).get(api::handlers::wireframes::list_wireframes),
        )
        .route("/wireframes/{uid}", get(api::handlers::wireframes::get_wireframe))
        .route("/wireframes/{uid}/code", put(api::handlers::wireframes::save_code))
        .route("/wireframes/{uid}/regenerate", post(api::handlers::wireframes::regenerate))
        .route("/wireframes/{uid}/export", get(api::handlers::export::export_code))
        .route("/generate", post(api::handlers::generation::stream_generation))
        .route("/models", get(api::handlers::generation::list_models));

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations,
///    and builds the router
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_with(options)
            .await?;

        migrator().run(&pool).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .limits(Limiters::new(&config.limits))
            .config(config.clone())
            .http(reqwest::Client::new())
            .build();

        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("wirecode listening on http://{bind_addr}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::create_test_app;

    #[tokio::test]
    async fn healthz_responds_ok() {
        let server = create_test_app().await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[tokio::test]
    async fn docs_are_served() {
        let server = create_test_app().await;

        let response = server.get("/docs").await;
        response.assert_status_ok();
    }
}
