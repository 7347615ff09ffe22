//! API request/response models for wireframe records.

use crate::db::models::wireframes::{CodePayload, WireframeDBResponse};
use crate::errors::{Error, Result};
use crate::generation::AttemptState;
use crate::types::WireframeId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireframeCreate {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub model: String,
    /// Owner email (must reference an existing user)
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WireframeCreated {
    pub id: WireframeId,
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireframeResponse {
    pub id: WireframeId,
    pub uid: String,
    pub description: String,
    pub image_url: String,
    pub model: String,
    pub created_by: String,
    /// Null while generation is pending
    pub code: Option<CodePayload>,
}

impl From<WireframeDBResponse> for WireframeResponse {
    fn from(db: WireframeDBResponse) -> Self {
        Self {
            id: db.id,
            uid: db.uid,
            description: db.description,
            image_url: db.image_url,
            model: db.model,
            created_by: db.created_by,
            code: db.code,
        }
    }
}

/// Query parameters for listing wireframes
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListWireframesQuery {
    /// Owner email to list records for
    pub email: Option<String>,
}

/// Generated-code payload as accepted on save.
///
/// Revisions of the client sent either a bare string or a `{resp}` object;
/// both are accepted and normalized to the canonical [`CodePayload`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CodeInput {
    Payload(CodePayload),
    Text(String),
}

impl CodeInput {
    /// Normalize to the canonical payload, rejecting empty content.
    pub fn normalize(self) -> Result<CodePayload> {
        let payload = match self {
            CodeInput::Payload(payload) => payload,
            CodeInput::Text(resp) => CodePayload { resp },
        };
        if payload.resp.trim().is_empty() {
            return Err(Error::InvalidPayload {
                message: "Code response is required".to_string(),
            });
        }
        Ok(payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveCodeRequest {
    pub code_resp: Option<CodeInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveCodeResponse {
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegenerateResponse {
    pub uid: String,
    /// Final state of the attempt: `persisted` or `persist_failed`
    pub state: AttemptState,
    /// The full generated code, even when the save step failed
    pub code: CodePayload,
    /// Whether the code was durably written to the record
    pub saved: bool,
    /// Save-step error message when `saved` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Export file format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jsx,
    Tsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jsx => "jsx",
            ExportFormat::Tsx => "tsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Jsx => "text/jsx",
            ExportFormat::Tsx => "text/typescript",
        }
    }
}

/// Query parameters for code export
#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Output format; defaults to jsx
    pub format: Option<ExportFormat>,
}
