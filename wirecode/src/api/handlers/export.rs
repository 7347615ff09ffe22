//! Code export as a downloadable file.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use chrono::Utc;

use crate::{
    AppState,
    api::handlers::wireframes::fetch_record,
    api::models::wireframes::ExportQuery,
    errors::{Error, Result},
};

/// Download a record's generated code as a source file.
///
/// The filename embeds a uid prefix and the export date, e.g.
/// `wireframe-a1b2c3d4-2026-08-23.jsx`.
#[utoipa::path(
    get,
    path = "/wireframes/{uid}/export",
    tag = "wireframes",
    summary = "Export generated code as a file",
    params(
        ("uid" = String, Path, description = "Client-chosen record identifier"),
        ExportQuery,
    ),
    responses(
        (status = 200, description = "Source file attachment"),
        (status = 404, description = "No record with this uid, or no code generated yet"),
    )
)]
pub async fn export_code(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let record = fetch_record(&state, &uid).await?;

    let code = record.code.ok_or_else(|| Error::NotFound {
        resource: "Code".to_string(),
        id: uid.clone(),
    })?;

    let format = query.format.unwrap_or_default();
    let prefix: String = uid.chars().take(8).collect();
    let filename = format!("wireframe-{prefix}-{}.{}", Utc::now().format("%Y-%m-%d"), format.extension());

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))
        .header(header::CACHE_CONTROL, "no-cache")
        .body(code.resp.into())
        .map_err(|e| Error::Other(e.into()))?)
}
