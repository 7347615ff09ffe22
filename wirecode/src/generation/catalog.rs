//! Fixed catalog of supported AI models.
//!
//! Records store the catalog `name`; the orchestrator maps it to the concrete
//! `backend_id` understood by the completion service. An unknown name is a
//! fatal `InvalidModel` error before any network call or credit debit.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AiModel {
    /// Public catalog name stored on wireframe records
    pub name: &'static str,
    /// Human-readable label for pickers
    pub display_name: &'static str,
    /// Concrete backend model identifier sent to the completion service
    pub backend_id: &'static str,
}

pub const AI_MODELS: &[AiModel] = &[
    AiModel {
        name: "gemini-google",
        display_name: "Gemini Google",
        backend_id: "google/gemini-2.0-flash-exp:free",
    },
    AiModel {
        name: "llama-by-meta",
        display_name: "Llama by Meta",
        backend_id: "meta-llama/llama-3.2-90b-vision-instruct:free",
    },
    AiModel {
        name: "deepseek",
        display_name: "Deepseek",
        backend_id: "deepseek/deepseek-r1-distill-llama-70b:free",
    },
];

/// Look up a model by its catalog name.
pub fn resolve(name: &str) -> Option<&'static AiModel> {
    AI_MODELS.iter().find(|model| model.name == name)
}

/// Fixed system suffix appended to the user's wireframe description.
pub const PROMPT: &str = "You are a professional React developer and UI/UX designer. \
Convert the attached wireframe image into working front-end code: \
based on the wireframe image, generate a similar web page, \
and based on the description write React and Tailwind CSS code. \
Make sure the design is modern and responsive. \
Return a single React component in one file, with all markup and styling inline. \
Do not include explanations, only code.";
