//! OpenAPI documentation for the service API at `/api/v1/*`.

use utoipa::OpenApi;

use crate::api;
use crate::db::models::wireframes::CodePayload;
use crate::generation::AttemptState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "wirecode API",
        description = "Credit-gated wireframe-to-code generation service. \
            Clients create wireframe records from a reference image and a \
            description, stream AI-generated React code, and save or export \
            the result.",
    ),
    paths(
        api::handlers::users::ensure_user,
        api::handlers::users::get_user,
        api::handlers::users::add_credits,
        api::handlers::wireframes::create_wireframe,
        api::handlers::wireframes::get_wireframe,
        api::handlers::wireframes::list_wireframes,
        api::handlers::wireframes::save_code,
        api::handlers::wireframes::regenerate,
        api::handlers::export::export_code,
        api::handlers::generation::stream_generation,
        api::handlers::generation::list_models,
    ),
    components(schemas(
        api::models::users::UserEnsureRequest,
        api::models::users::UserResponse,
        api::models::users::CreditTopUp,
        api::models::wireframes::WireframeCreate,
        api::models::wireframes::WireframeCreated,
        api::models::wireframes::WireframeResponse,
        api::models::wireframes::SaveCodeRequest,
        api::models::wireframes::SaveCodeResponse,
        api::models::wireframes::RegenerateResponse,
        api::models::wireframes::ExportFormat,
        api::models::generation::GenerateRequest,
        api::models::generation::ModelResponse,
        CodePayload,
        AttemptState,
    )),
    tags(
        (name = "users", description = "User management and the credit ledger"),
        (name = "wireframes", description = "Wireframe records and their generated code"),
        (name = "generation", description = "Streaming code generation"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn spec_serializes_and_lists_all_routes() {
        let spec = ApiDoc::openapi().to_json().expect("spec serializes");
        let spec: serde_json::Value = serde_json::from_str(&spec).unwrap();

        let paths = spec["paths"].as_object().unwrap();
        for route in [
            "/users",
            "/users/{email}/credits",
            "/wireframes",
            "/wireframes/{uid}",
            "/wireframes/{uid}/code",
            "/wireframes/{uid}/regenerate",
            "/wireframes/{uid}/export",
            "/generate",
            "/models",
        ] {
            assert!(paths.contains_key(route), "missing route {route}");
        }
    }
}
