//! API request/response models for generation.

use crate::generation::catalog::AiModel;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub image_url: String,
}

/// Catalog entry as exposed to clients (the backend identifier stays
/// internal).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub name: &'static str,
    pub display_name: &'static str,
}

impl From<&AiModel> for ModelResponse {
    fn from(model: &AiModel) -> Self {
        Self {
            name: model.name,
            display_name: model.display_name,
        }
    }
}
