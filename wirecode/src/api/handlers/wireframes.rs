//! Handlers for wireframe records: creation (with the credit debit),
//! retrieval, manual code save, and server-side regeneration.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::handlers::require_fields,
    api::models::wireframes::{
        ListWireframesQuery, RegenerateResponse, SaveCodeRequest, SaveCodeResponse, WireframeCreate, WireframeCreated,
        WireframeResponse,
    },
    auth::CallerIdentity,
    db::{
        errors::DbError,
        handlers::{Repository, Users, Wireframes, users::DebitOutcome, wireframes::WireframeFilter},
        models::wireframes::{WireframeCreateDBRequest, WireframeDBResponse},
    },
    errors::{Error, Result},
    generation::{AttemptState, Orchestrator, catalog},
};

/// Create a wireframe record and debit one generation's worth of credits.
///
/// The insert and the debit run in a single transaction: a duplicate uid or
/// an insufficient balance rolls the whole request back, so a rejected
/// request never costs credits and a debited credit always has a record.
#[utoipa::path(
    post,
    path = "/wireframes",
    tag = "wireframes",
    summary = "Create a wireframe record",
    request_body = WireframeCreate,
    responses(
        (status = 201, description = "Record created, generation pending", body = WireframeCreated),
        (status = 400, description = "Missing fields or unknown model"),
        (status = 402, description = "Insufficient credits"),
        (status = 404, description = "Owner does not exist"),
        (status = 409, description = "A record with this uid already exists"),
        (status = 429, description = "Creation rate limit exceeded"),
    )
)]
#[instrument(skip(state, data), fields(uid = %data.uid, email = %data.email))]
pub async fn create_wireframe(
    State(state): State<AppState>,
    Json(data): Json<WireframeCreate>,
) -> Result<(StatusCode, Json<WireframeCreated>)> {
    require_fields(&[
        ("uid", &data.uid),
        ("description", &data.description),
        ("imageUrl", &data.image_url),
        ("model", &data.model),
        ("email", &data.email),
    ])?;

    state.limits.check_wireframe_creation(&data.email)?;

    // Reject unknown models before any state is touched
    if catalog::resolve(&data.model).is_none() {
        return Err(Error::InvalidModel {
            model: data.model.clone(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    Users::new(&mut tx)
        .get_by_email(&data.email)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: data.email.clone(),
        })?;

    let record = Wireframes::new(&mut tx)
        .create(&WireframeCreateDBRequest {
            uid: data.uid.clone(),
            description: data.description,
            image_url: data.image_url,
            model: data.model,
            created_by: data.email.clone(),
        })
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => Error::Conflict {
                message: format!("A wireframe with uid {} already exists", data.uid),
            },
            other => other.into(),
        })?;

    let cost = state.config.credits.generation_cost;
    let enforce = state.config.credits.enforce_debits;
    match Users::new(&mut tx).debit(&data.email, cost, enforce).await? {
        DebitOutcome::Applied(user) => {
            info!(credits_remaining = user.credits, "Wireframe created and credits debited");
        }
        // Dropping the transaction rolls back the inserted record
        DebitOutcome::InsufficientCredits => return Err(Error::InsufficientCredits),
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(WireframeCreated {
            id: record.id,
            uid: record.uid,
        }),
    ))
}

/// Fetch a single record by its client-chosen uid
#[utoipa::path(
    get,
    path = "/wireframes/{uid}",
    tag = "wireframes",
    summary = "Get a wireframe by uid",
    params(
        ("uid" = String, Path, description = "Client-chosen record identifier"),
    ),
    responses(
        (status = 200, description = "Wireframe record", body = WireframeResponse),
        (status = 404, description = "No record with this uid"),
    )
)]
pub async fn get_wireframe(State(state): State<AppState>, Path(uid): Path<String>) -> Result<Json<WireframeResponse>> {
    let record = fetch_record(&state, &uid).await?;
    Ok(Json(record.into()))
}

/// List an owner's records, newest first
#[utoipa::path(
    get,
    path = "/wireframes",
    tag = "wireframes",
    summary = "List wireframes for an owner",
    params(ListWireframesQuery),
    responses(
        (status = 200, description = "Records in reverse creation order (may be empty)", body = [WireframeResponse]),
        (status = 400, description = "Missing email parameter"),
    )
)]
pub async fn list_wireframes(
    State(state): State<AppState>,
    Query(query): Query<ListWireframesQuery>,
) -> Result<Json<Vec<WireframeResponse>>> {
    let email = query.email.unwrap_or_default();
    require_fields(&[("email", &email)])?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let records = Wireframes::new(&mut conn)
        .list(&WireframeFilter { created_by: email })
        .await?;

    Ok(Json(records.into_iter().map(WireframeResponse::from).collect()))
}

/// Save client-provided generated code onto a record
#[utoipa::path(
    put,
    path = "/wireframes/{uid}/code",
    tag = "wireframes",
    summary = "Save generated code for a wireframe",
    params(
        ("uid" = String, Path, description = "Client-chosen record identifier"),
    ),
    request_body = SaveCodeRequest,
    responses(
        (status = 200, description = "Code saved", body = SaveCodeResponse),
        (status = 400, description = "Missing or empty code payload"),
        (status = 401, description = "No caller identity"),
        (status = 403, description = "Caller does not own the record"),
        (status = 404, description = "No record with this uid"),
    )
)]
#[instrument(skip(state, identity, data), fields(uid = %uid, caller = %identity.email))]
pub async fn save_code(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(uid): Path<String>,
    Json(data): Json<SaveCodeRequest>,
) -> Result<Json<SaveCodeResponse>> {
    let payload = data
        .code_resp
        .ok_or_else(|| Error::InvalidPayload {
            message: "Code response is required".to_string(),
        })?
        .normalize()?;

    let record = fetch_record(&state, &uid).await?;
    identity.ensure_owns(&record)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let updated = Wireframes::new(&mut conn).set_code(&uid, &payload).await?;

    Ok(Json(SaveCodeResponse { uid: updated.uid }))
}

/// Re-run generation for an existing record and overwrite its code.
///
/// Regeneration does not debit credits; the record's original creation
/// already paid for it. A persistence failure after a completed stream is
/// reported in-band with the full code so the caller can save manually.
#[utoipa::path(
    post,
    path = "/wireframes/{uid}/regenerate",
    tag = "wireframes",
    summary = "Regenerate code for a wireframe",
    params(
        ("uid" = String, Path, description = "Client-chosen record identifier"),
    ),
    responses(
        (status = 200, description = "Attempt outcome with the generated code", body = RegenerateResponse),
        (status = 401, description = "No caller identity"),
        (status = 403, description = "Caller does not own the record"),
        (status = 404, description = "No record with this uid"),
        (status = 503, description = "AI service unavailable or returned nothing"),
    )
)]
#[instrument(skip(state, identity), fields(uid = %uid, caller = %identity.email))]
pub async fn regenerate(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(uid): Path<String>,
) -> Result<Json<RegenerateResponse>> {
    let record = fetch_record(&state, &uid).await?;
    identity.ensure_owns(&record)?;

    let outcome = Orchestrator::new(&state).generate_and_persist(&record).await?;

    Ok(Json(RegenerateResponse {
        uid: record.uid,
        state: outcome.state,
        code: crate::db::models::wireframes::CodePayload { resp: outcome.code },
        saved: outcome.state == AttemptState::Persisted,
        error: outcome.persist_error,
    }))
}

pub(crate) async fn fetch_record(state: &AppState, uid: &str) -> Result<WireframeDBResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Wireframes::new(&mut conn)
        .get_by_uid(uid)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Wireframe".to_string(),
            id: uid.to_string(),
        })
}
