//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all endpoints
//! - **[`models`]**: Request/response data structures
//!
//! The wire format keeps the camelCase field names established by earlier
//! revisions of the service (`imageUrl`, `createdBy`, `codeResp`), so
//! existing clients keep working. All endpoints are documented with OpenAPI
//! annotations via `utoipa`; the rendered docs are served at `/docs`.

pub mod handlers;
pub mod models;
