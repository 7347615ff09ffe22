//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Find-or-create request sent on first authenticated contact.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserEnsureRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub credits: i64,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            credits: db.credits,
        }
    }
}

/// Query parameters for user lookup
#[derive(Debug, Deserialize, IntoParams)]
pub struct GetUserQuery {
    /// Email of the user to fetch
    pub email: Option<String>,
}

/// Administrative credit top-up
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditTopUp {
    /// Number of credits to add (must be positive)
    pub amount: i64,
}
