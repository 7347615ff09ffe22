//! Streaming generation endpoint.
//!
//! The response body is the generated source itself, streamed as plain text
//! fragments in arrival order. Upstream failures that occur after streaming
//! has begun cannot change the status line, so they are surfaced in-band as
//! a single `// Error:` comment fragment the client can render verbatim.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use tokio_stream::StreamExt;
use tracing::{instrument, warn};

use crate::{
    AppState,
    api::handlers::require_fields,
    api::models::generation::{GenerateRequest, ModelResponse},
    errors::Result,
    generation::{GenerationRequest, StreamEvent, catalog, open_stream},
};

/// Stream generated code for a description and reference image.
///
/// Stateless: nothing is persisted and no credits are debited here. The
/// record-bound flow is `POST /wireframes` followed by client-side save or
/// `POST /wireframes/{uid}/regenerate`.
#[utoipa::path(
    post,
    path = "/generate",
    tag = "generation",
    summary = "Stream generated code",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Plain-text code stream", content_type = "text/plain"),
        (status = 400, description = "Missing fields or unknown model"),
        (status = 503, description = "AI service unreachable (body carries an inline // Error comment)"),
    )
)]
#[instrument(skip(state, data), fields(model = %data.model))]
pub async fn stream_generation(State(state): State<AppState>, Json(data): Json<GenerateRequest>) -> Result<Response> {
    require_fields(&[
        ("description", &data.description),
        ("model", &data.model),
        ("imageUrl", &data.image_url),
    ])?;

    let request = GenerationRequest {
        description: data.description,
        model: data.model,
        image_url: data.image_url,
    };

    let stream = match open_stream(&state.http, &state.config.ai, &request).await {
        Ok(stream) => stream,
        // The stream never opened; keep the inline-comment contract but use
        // a real error status since no bytes have been sent yet
        Err(err) => {
            warn!("Generation stream failed to open: {err}");
            return Ok(plain_text(err.status_code(), format!("// Error: {}", err.user_message())));
        }
    };

    let body = Body::from_stream(stream.map(|event| {
        let bytes = match event {
            StreamEvent::Chunk(text) => Bytes::from(text),
            StreamEvent::UpstreamError(message) => Bytes::from(format!("// Error: {message}")),
        };
        Ok::<_, Infallible>(bytes)
    }));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| crate::errors::Error::Other(e.into()))?)
}

/// List the models available for generation
#[utoipa::path(
    get,
    path = "/models",
    tag = "generation",
    summary = "List available models",
    responses(
        (status = 200, description = "Model catalog", body = [ModelResponse]),
    )
)]
pub async fn list_models() -> Json<Vec<ModelResponse>> {
    Json(catalog::AI_MODELS.iter().map(ModelResponse::from).collect())
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8"), (header::CACHE_CONTROL, "no-cache")],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, create_test_app_with, sse_body, test_config};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generate_body() -> serde_json::Value {
        json!({
            "description": "login page with two inputs",
            "model": "gemini-google",
            "imageUrl": "https://storage.example.com/frame.png",
        })
    }

    #[tokio::test]
    async fn streams_cleaned_fragments_as_plain_text() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(sse_body(&["```jsx\nexport default ", "function App() {}", "\n```"]), "text/event-stream"),
            )
            .mount(&upstream)
            .await;

        let mut config = test_config();
        config.ai.base_url = upstream.uri().parse().unwrap();
        let server = create_test_app_with(config).await;

        let response = server.post("/api/v1/generate").json(&generate_body()).await;
        response.assert_status_ok();
        assert!(
            response
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        assert_eq!(response.text(), "\nexport default function App() {}\n");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_any_upstream_call() {
        let server = create_test_app().await;

        let response = server.post("/api/v1/generate").json(&json!({"model": "gemini-google"})).await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["kind"], "missing_fields");
    }

    #[tokio::test]
    async fn unknown_model_is_an_inline_error_comment() {
        let server = create_test_app().await;

        let mut body = generate_body();
        body["model"] = json!("not-a-model");
        let response = server.post("/api/v1/generate").json(&body).await;
        response.assert_status_bad_request();
        assert!(response.text().starts_with("// Error:"));
    }

    #[tokio::test]
    async fn upstream_failure_is_an_inline_error_comment() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&upstream)
            .await;

        let mut config = test_config();
        config.ai.base_url = upstream.uri().parse().unwrap();
        let server = create_test_app_with(config).await;

        let response = server.post("/api/v1/generate").json(&generate_body()).await;
        response.assert_status_service_unavailable();
        assert!(response.text().starts_with("// Error:"));
    }

    #[tokio::test]
    async fn model_catalog_lists_public_names_only() {
        let server = create_test_app().await;

        let response = server.get("/api/v1/models").await;
        response.assert_status_ok();
        let models: Vec<serde_json::Value> = response.json();
        assert_eq!(models.len(), 3);
        let names: Vec<_> = models.iter().map(|m| m["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"gemini-google"));
        // Backend identifiers are not exposed
        assert!(models.iter().all(|m| m.get("backendId").is_none()));
    }
}
