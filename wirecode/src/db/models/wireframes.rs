//! Database models for wireframe records.

use crate::types::WireframeId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical generated-code payload.
///
/// Earlier revisions of the wire format stored either a bare string or a
/// `{resp}` object in the `code` column; everything is normalized to this
/// shape on ingress and on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CodePayload {
    pub resp: String,
}

/// Decode the stored `code` column into the canonical payload.
///
/// Accepts the canonical `{"resp": "..."}` JSON object, a JSON string, or
/// legacy raw text that predates JSON encoding.
pub fn decode_code(stored: Option<String>) -> Option<CodePayload> {
    let raw = stored?;
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Object(map)) => match map.get("resp").and_then(|v| v.as_str()) {
            Some(resp) => Some(CodePayload { resp: resp.to_string() }),
            None => Some(CodePayload { resp: raw }),
        },
        Ok(serde_json::Value::String(s)) => Some(CodePayload { resp: s }),
        _ => Some(CodePayload { resp: raw }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireframeCreateDBRequest {
    pub uid: String,
    pub description: String,
    pub image_url: String,
    pub model: String,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireframeDBResponse {
    pub id: WireframeId,
    pub uid: String,
    pub description: String,
    pub image_url: String,
    pub model: String,
    pub created_by: String,
    pub code: Option<CodePayload>,
}
