//! Database models for users.

use crate::types::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    /// Initial credit grant for new users
    pub credits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub credits: i64,
}
