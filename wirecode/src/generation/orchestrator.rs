//! End-to-end generation for a stored wireframe record.

use serde::Serialize;
use sqlx::SqlitePool;
use tokio_stream::StreamExt;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::config::AiConfig;
use crate::db::handlers::Wireframes;
use crate::db::models::wireframes::{CodePayload, WireframeDBResponse};
use crate::errors::{Error, Result};
use crate::generation::stream::{GenerationRequest, StreamEvent, open_stream};

/// State of a single generation attempt.
///
/// `Persisted` and `Failed` are terminal; a regeneration starts a fresh
/// attempt from `Idle`. Failure paths never write partial code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Idle,
    Streaming,
    Completed,
    Persisted,
    PersistFailed,
    Failed,
}

/// Result of a completed attempt.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The full accumulated, cleaned source text.
    pub code: String,
    /// `Persisted` or `PersistFailed`.
    pub state: AttemptState,
    /// User-facing message when the save step failed; the code above is
    /// still usable in the current session and can be saved manually.
    pub persist_error: Option<String>,
}

/// Drives one generation attempt for a record: open the stream, accumulate
/// cleaned fragments, persist the final text back to the record store.
pub struct Orchestrator {
    http: reqwest::Client,
    ai: AiConfig,
    db: SqlitePool,
}

impl Orchestrator {
    pub fn new(state: &crate::AppState) -> Self {
        Self {
            http: state.http.clone(),
            ai: state.config.ai.clone(),
            db: state.db.clone(),
        }
    }

    /// Run one attempt to completion.
    ///
    /// Returns `Err` for attempts that end in `Failed` (unknown model,
    /// upstream error before or during the stream, empty completion): the
    /// record keeps its previous `code`, pending records stay pending.
    ///
    /// A persistence failure after a completed stream is NOT an `Err`: the
    /// outcome carries the accumulated code with `state = PersistFailed` so
    /// the caller can still use it and retry the save.
    pub async fn generate_and_persist(&self, record: &WireframeDBResponse) -> Result<GenerationOutcome> {
        let request = GenerationRequest {
            description: record.description.clone(),
            model: record.model.clone(),
            image_url: record.image_url.clone(),
        };

        let mut stream = open_stream(&self.http, &self.ai, &request).await?;

        let mut code = String::new();
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Chunk(text) => code.push_str(&text),
                StreamEvent::UpstreamError(message) => {
                    // Discard the partial accumulation; the record stays pending
                    return Err(Error::Upstream {
                        service: "AI".to_string(),
                        message,
                    });
                }
            }
        }

        if code.trim().is_empty() {
            return Err(Error::Upstream {
                service: "AI".to_string(),
                message: "completion stream produced no content".to_string(),
            });
        }

        info!(uid = %record.uid, bytes = code.len(), "Generation completed, persisting");

        let payload = CodePayload { resp: code.clone() };
        match self.persist(&record.uid, &payload).await {
            Ok(()) => Ok(GenerationOutcome {
                code,
                state: AttemptState::Persisted,
                persist_error: None,
            }),
            Err(err) => {
                error!(uid = %record.uid, "Failed to persist generated code: {err:#}");
                let persistence = Error::Persistence {
                    operation: "generated code".to_string(),
                    source: err,
                };
                Ok(GenerationOutcome {
                    code,
                    state: AttemptState::PersistFailed,
                    persist_error: Some(persistence.user_message()),
                })
            }
        }
    }

    async fn persist(&self, uid: &str, payload: &CodePayload) -> std::result::Result<(), crate::db::errors::DbError> {
        let mut conn = self.db.acquire().await?;
        Wireframes::new(&mut conn).set_code(uid, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Repository, Users, Wireframes};
    use crate::db::models::users::UserCreateDBRequest;
    use crate::db::models::wireframes::WireframeCreateDBRequest;
    use crate::test_utils::{sse_body, test_ai_config, test_pool};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn seed_record(pool: &SqlitePool, uid: &str, model: &str) -> WireframeDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .ensure(&UserCreateDBRequest {
                name: "Owner".to_string(),
                email: "owner@example.com".to_string(),
                credits: 3,
            })
            .await
            .unwrap();
        Wireframes::new(&mut conn)
            .create(&WireframeCreateDBRequest {
                uid: uid.to_string(),
                description: "pricing page".to_string(),
                image_url: "https://storage.example.com/frame.png".to_string(),
                model: model.to_string(),
                created_by: "owner@example.com".to_string(),
            })
            .await
            .unwrap()
    }

    fn orchestrator(pool: &SqlitePool, upstream: &str) -> Orchestrator {
        Orchestrator {
            http: reqwest::Client::new(),
            ai: test_ai_config(upstream),
            db: pool.clone(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn successful_attempt_persists_accumulated_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(sse_body(&["```jsx\nexport default", " function App() {}"]), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let pool = test_pool().await;
        let record = seed_record(&pool, "frame-ok", "gemini-google").await;

        let outcome = orchestrator(&pool, &server.uri())
            .generate_and_persist(&record)
            .await
            .unwrap();

        assert_eq!(outcome.state, AttemptState::Persisted);
        assert_eq!(outcome.code, "\nexport default function App() {}");
        assert!(outcome.persist_error.is_none());

        let mut conn = pool.acquire().await.unwrap();
        let saved = Wireframes::new(&mut conn).get_by_uid("frame-ok").await.unwrap().unwrap();
        assert_eq!(saved.code.unwrap().resp, "\nexport default function App() {}");
    }

    #[test_log::test(tokio::test)]
    async fn failed_stream_leaves_record_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let pool = test_pool().await;
        let record = seed_record(&pool, "frame-fail", "gemini-google").await;

        let err = orchestrator(&pool, &server.uri())
            .generate_and_persist(&record)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));

        let mut conn = pool.acquire().await.unwrap();
        let saved = Wireframes::new(&mut conn).get_by_uid("frame-fail").await.unwrap().unwrap();
        assert!(saved.code.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn unknown_model_fails_without_touching_the_record() {
        let pool = test_pool().await;
        let record = seed_record(&pool, "frame-bad-model", "not-a-model").await;

        let err = orchestrator(&pool, "http://127.0.0.1:1")
            .generate_and_persist(&record)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModel { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn empty_completion_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("data: [DONE]\n\n".to_string(), "text/event-stream"))
            .mount(&server)
            .await;

        let pool = test_pool().await;
        let record = seed_record(&pool, "frame-empty", "gemini-google").await;

        let err = orchestrator(&pool, &server.uri())
            .generate_and_persist(&record)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn regeneration_overwrites_previous_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body(&["second attempt"]), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let pool = test_pool().await;
        let record = seed_record(&pool, "frame-regen", "gemini-google").await;

        {
            let mut conn = pool.acquire().await.unwrap();
            Wireframes::new(&mut conn)
                .set_code(
                    "frame-regen",
                    &CodePayload {
                        resp: "first attempt".to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let outcome = orchestrator(&pool, &server.uri())
            .generate_and_persist(&record)
            .await
            .unwrap();
        assert_eq!(outcome.state, AttemptState::Persisted);

        let mut conn = pool.acquire().await.unwrap();
        let saved = Wireframes::new(&mut conn).get_by_uid("frame-regen").await.unwrap().unwrap();
        assert_eq!(saved.code.unwrap().resp, "second attempt");
    }
}
