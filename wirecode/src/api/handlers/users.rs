//! Handlers for user management and the credit ledger.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::{
    AppState,
    api::handlers::require_fields,
    api::models::users::{CreditTopUp, GetUserQuery, UserEnsureRequest, UserResponse},
    db::{errors::DbError, handlers::Users, models::users::UserCreateDBRequest},
    errors::{Error, Result},
};

/// Find or create a user on first authenticated contact
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Find or create a user",
    description = "Idempotent: an existing user is returned unchanged, a new user is created with the default credit grant",
    request_body = UserEnsureRequest,
    responses(
        (status = 200, description = "User found or created", body = UserResponse),
        (status = 400, description = "Missing required fields"),
    )
)]
pub async fn ensure_user(State(state): State<AppState>, Json(data): Json<UserEnsureRequest>) -> Result<Json<UserResponse>> {
    require_fields(&[("userName", &data.user_name), ("userEmail", &data.user_email)])?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .ensure(&UserCreateDBRequest {
            name: data.user_name,
            email: data.user_email,
            credits: state.config.credits.initial_credits,
        })
        .await?;

    Ok(Json(user.into()))
}

/// Look up a user by email
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "Get a user by email",
    params(GetUserQuery),
    responses(
        (status = 200, description = "User record", body = UserResponse),
        (status = 400, description = "Missing email parameter"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(State(state): State<AppState>, Query(query): Query<GetUserQuery>) -> Result<Json<UserResponse>> {
    let email = query.email.unwrap_or_default();
    require_fields(&[("email", &email)])?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: email.clone(),
        })?;

    Ok(Json(user.into()))
}

/// Administrative credit top-up
#[utoipa::path(
    post,
    path = "/users/{email}/credits",
    tag = "users",
    summary = "Add credits to a user's balance",
    params(
        ("email" = String, Path, description = "User email"),
    ),
    request_body = CreditTopUp,
    responses(
        (status = 201, description = "Updated user", body = UserResponse),
        (status = 400, description = "Non-positive amount"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn add_credits(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(data): Json<CreditTopUp>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if data.amount <= 0 {
        return Err(Error::InvalidPayload {
            message: "Credit amount must be positive".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).credit(&email, data.amount).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "User".to_string(),
            id: email.clone(),
        },
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use serde_json::json;

    #[tokio::test]
    async fn ensure_user_grants_default_credits_once() {
        let server = create_test_app().await;

        let first = server
            .post("/api/v1/users")
            .json(&json!({"userName": "Ada", "userEmail": "ada@example.com"}))
            .await;
        first.assert_status_ok();
        let user: serde_json::Value = first.json();
        assert_eq!(user["credits"], 3);
        let id = user["id"].as_i64().unwrap();

        // Calling again returns the same user and does not reset credits
        let again = server
            .post("/api/v1/users")
            .json(&json!({"userName": "Ada", "userEmail": "ada@example.com"}))
            .await;
        again.assert_status_ok();
        let user: serde_json::Value = again.json();
        assert_eq!(user["id"].as_i64().unwrap(), id);
        assert_eq!(user["credits"], 3);
    }

    #[tokio::test]
    async fn ensure_user_requires_name_and_email() {
        let server = create_test_app().await;

        let response = server.post("/api/v1/users").json(&json!({"userName": "Ada"})).await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["kind"], "missing_fields");
        assert!(body["error"].as_str().unwrap().contains("userEmail"));
    }

    #[tokio::test]
    async fn get_user_round_trip_and_not_found() {
        let server = create_test_app().await;

        server
            .post("/api/v1/users")
            .json(&json!({"userName": "Ada", "userEmail": "ada@example.com"}))
            .await
            .assert_status_ok();

        let found = server.get("/api/v1/users").add_query_param("email", "ada@example.com").await;
        found.assert_status_ok();
        let user: serde_json::Value = found.json();
        assert_eq!(user["email"], "ada@example.com");

        let missing = server.get("/api/v1/users").add_query_param("email", "ghost@example.com").await;
        missing.assert_status_not_found();
        let body: serde_json::Value = missing.json();
        assert_eq!(body["kind"], "not_found");

        let no_param = server.get("/api/v1/users").await;
        no_param.assert_status_bad_request();
    }

    #[tokio::test]
    async fn add_credits_tops_up_existing_user() {
        let server = create_test_app().await;

        server
            .post("/api/v1/users")
            .json(&json!({"userName": "Ada", "userEmail": "ada@example.com"}))
            .await
            .assert_status_ok();

        let topped = server
            .post("/api/v1/users/ada@example.com/credits")
            .json(&json!({"amount": 50}))
            .await;
        topped.assert_status(axum::http::StatusCode::CREATED);
        let user: serde_json::Value = topped.json();
        assert_eq!(user["credits"], 53);

        let negative = server
            .post("/api/v1/users/ada@example.com/credits")
            .json(&json!({"amount": -5}))
            .await;
        negative.assert_status_bad_request();

        let ghost = server
            .post("/api/v1/users/ghost@example.com/credits")
            .json(&json!({"amount": 5}))
            .await;
        ghost.assert_status_not_found();
    }
}
