//! Streaming client for the OpenAI-compatible completion service.
//!
//! Opens one SSE token stream per generation, strips markdown fence
//! artifacts from each delta, and forwards cleaned fragments over a bounded
//! channel. The returned stream is lazy, finite, and non-restartable;
//! dropping the receiver is the cancellation signal (the producer task stops
//! at the next send).

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::config::AiConfig;
use crate::errors::{Error, Result};
use crate::generation::catalog;

/// One item of a generation stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A cleaned text fragment, append-only and order-preserving.
    Chunk(String),
    /// The upstream connection failed mid-stream. Terminal for the stream.
    UpstreamError(String),
}

/// Inputs for one generation attempt.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub description: String,
    pub model: String,
    pub image_url: String,
}

/// Markdown fence artifacts removed from each incoming chunk, in order.
///
/// Matches are literal and only the first occurrence of each token is
/// removed per chunk. A fence split across chunk boundaries may therefore
/// survive partially; this is a known limitation, kept so the incremental
/// output matches what consumers already expect.
const FENCE_ARTIFACTS: [&str; 5] = ["```jsx", "```javascript", "javascript", "jsx", "```"];

/// Strip fence artifacts from a single chunk.
pub fn clean_chunk(text: &str) -> String {
    FENCE_ARTIFACTS
        .iter()
        .fold(text.to_string(), |acc, artifact| acc.replacen(artifact, "", 1))
}

// Request wire format (OpenAI chat completions)

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrlPart },
}

#[derive(Debug, Serialize)]
struct ImageUrlPart {
    url: String,
}

// Response wire format (one SSE `data:` line per delta)

#[derive(Debug, Default, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Open a token stream for one generation attempt.
///
/// Validates the model against the catalog before any network call, then
/// opens the SSE stream and spawns a reader task that forwards cleaned
/// fragments. Errors before the stream is established (unknown model,
/// missing configuration, upstream rejection) are returned as `Err`; errors
/// after that arrive in-band as [`StreamEvent::UpstreamError`] so stream
/// framing is preserved.
pub async fn open_stream(
    http: &reqwest::Client,
    config: &AiConfig,
    request: &GenerationRequest,
) -> Result<ReceiverStream<StreamEvent>> {
    let model = catalog::resolve(&request.model).ok_or_else(|| Error::InvalidModel {
        model: request.model.clone(),
    })?;

    let api_key = config.api_key.as_deref().ok_or_else(|| Error::Upstream {
        service: "AI".to_string(),
        message: "AI service configuration missing".to_string(),
    })?;

    let body = ChatCompletionRequest {
        model: model.backend_id,
        stream: true,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        messages: vec![UserMessage {
            role: "user",
            content: vec![
                ContentPart::Text {
                    text: format!("{}:{}", request.description, catalog::PROMPT),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrlPart {
                        url: request.image_url.clone(),
                    },
                },
            ],
        }],
    };

    let endpoint = format!("{}/chat/completions", config.base_url.as_str().trim_end_matches('/'));
    debug!(model = model.backend_id, "Opening generation stream");

    let response = http
        .post(&endpoint)
        .bearer_auth(api_key)
        .timeout(config.request_timeout)
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Upstream {
            service: "AI".to_string(),
            message: e.to_string(),
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        return Err(Error::Upstream {
            service: "AI".to_string(),
            message: format!("completion request failed with {status}: {detail}"),
        });
    }

    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(read_sse_stream(response, tx));

    Ok(ReceiverStream::new(rx))
}

/// Reader task: parse SSE lines from the response body and forward cleaned
/// fragments until `[DONE]`, the connection closes, or the receiver is
/// dropped (caller abandoned the generation).
async fn read_sse_stream(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut body = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(next) = body.next().await {
        let bytes = match next {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Generation stream dropped mid-flight: {e}");
                let _ = tx.send(StreamEvent::UpstreamError(e.to_string())).await;
                return;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&bytes));

        while let Some(newline) = buffer.find('\n') {
            let line: String = buffer.drain(..=newline).collect();
            let line = line.trim_end();

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim_start();

            if data == "[DONE]" {
                return;
            }

            let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
                continue;
            };

            let Some(content) = chunk.choices.first().and_then(|c| c.delta.content.as_deref()) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }

            let cleaned = clean_chunk(content);
            if tx.send(StreamEvent::Chunk(cleaned)).await.is_err() {
                // Receiver dropped: stop requesting further fragments
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sse_body, test_ai_config};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn clean_chunk_strips_fence_openers_and_language_tags() {
        assert_eq!(clean_chunk("```jsx\nconst App = () => {}"), "\nconst App = () => {}");
        assert_eq!(clean_chunk("```javascript\nlet x;"), "\nlet x;");
        assert_eq!(clean_chunk("plain text"), "plain text");
    }

    #[test]
    fn clean_chunk_removes_first_occurrence_only() {
        // Per-chunk literal substitution, applied once per artifact. A
        // trailing fence in the same chunk survives - the documented
        // limitation of per-chunk stripping.
        assert_eq!(clean_chunk("```jsx code ```"), " code ");
        assert_eq!(clean_chunk("``` a ``` b ```"), " a ``` b ```");
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            description: "login form".to_string(),
            model: "gemini-google".to_string(),
            image_url: "https://storage.example.com/frame.png".to_string(),
        }
    }

    #[tokio::test]
    async fn unknown_model_fails_before_any_network_call() {
        let config = test_ai_config("http://127.0.0.1:1"); // nothing listens here
        let http = reqwest::Client::new();

        let err = open_stream(
            &http,
            &config,
            &GenerationRequest {
                model: "gpt-9000".to_string(),
                ..request()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InvalidModel { .. }));
    }

    #[tokio::test]
    async fn streams_cleaned_fragments_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "google/gemini-2.0-flash-exp:free",
                "stream": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                sse_body(&["```jsx\nexport default", " function App()", " {}"]),
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let config = test_ai_config(&server.uri());
        let http = reqwest::Client::new();

        let stream = open_stream(&http, &config, &request()).await.unwrap();
        let events: Vec<_> = stream.collect().await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk("\nexport default".to_string()),
                StreamEvent::Chunk(" function App()".to_string()),
                StreamEvent::Chunk(" {}".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn upstream_rejection_surfaces_before_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let config = test_ai_config(&server.uri());
        let http = reqwest::Client::new();

        let err = open_stream(&http, &config, &request()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let mut config = test_ai_config("http://127.0.0.1:1");
        config.api_key = None;
        let http = reqwest::Client::new();

        let err = open_stream(&http, &config, &request()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }
}
