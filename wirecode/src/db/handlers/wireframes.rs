//! Database repository for wireframe records.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::wireframes::{CodePayload, WireframeCreateDBRequest, WireframeDBResponse, decode_code},
};
use crate::types::WireframeId;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing wireframe records
#[derive(Debug, Clone)]
pub struct WireframeFilter {
    /// Owner email (`created_by`)
    pub created_by: String,
}

// Database entity model; `code` is stored as nullable JSON text
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
struct Wireframe {
    pub id: WireframeId,
    pub uid: String,
    pub description: String,
    pub image_url: String,
    pub model: String,
    pub created_by: String,
    pub code: Option<String>,
}

impl From<Wireframe> for WireframeDBResponse {
    fn from(record: Wireframe) -> Self {
        Self {
            id: record.id,
            uid: record.uid,
            description: record.description,
            image_url: record.image_url,
            model: record.model,
            created_by: record.created_by,
            code: decode_code(record.code),
        }
    }
}

pub struct Wireframes<'c> {
    db: &'c mut SqliteConnection,
}

const SELECT_COLUMNS: &str = "id, uid, description, image_url, model, created_by, code";

impl<'c> Wireframes<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_uid(&mut self, uid: &str) -> Result<Option<WireframeDBResponse>> {
        let record = sqlx::query_as::<_, Wireframe>(&format!("SELECT {SELECT_COLUMNS} FROM wireframes WHERE uid = ?1"))
            .bind(uid)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(record.map(WireframeDBResponse::from))
    }

    /// Overwrite the `code` column for a record.
    ///
    /// Unconditional by design: regeneration is an explicit overwrite and the
    /// final write of an attempt is the single point of truth, last write
    /// wins. The UPDATE itself is atomic with respect to the row.
    #[instrument(skip(self, payload), fields(uid = %uid), err)]
    pub async fn set_code(&mut self, uid: &str, payload: &CodePayload) -> Result<WireframeDBResponse> {
        let encoded = serde_json::to_string(payload).map_err(|e| DbError::Other(e.into()))?;

        let record = sqlx::query_as::<_, Wireframe>(&format!(
            "UPDATE wireframes SET code = ?1 WHERE uid = ?2 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(encoded)
        .bind(uid)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(record.into())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Wireframes<'c> {
    type CreateRequest = WireframeCreateDBRequest;
    type Response = WireframeDBResponse;
    type Id = WireframeId;
    type Filter = WireframeFilter;

    #[instrument(skip(self, request), fields(uid = %request.uid), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let record = sqlx::query_as::<_, Wireframe>(&format!(
            r#"
            INSERT INTO wireframes (uid, description, image_url, model, created_by)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(&request.uid)
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(&request.model)
        .bind(&request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record.into())
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let record = sqlx::query_as::<_, Wireframe>(&format!("SELECT {SELECT_COLUMNS} FROM wireframes WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(record.map(WireframeDBResponse::from))
    }

    /// List an owner's records, most recent first (one-shot snapshot).
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let records = sqlx::query_as::<_, Wireframe>(&format!(
            "SELECT {SELECT_COLUMNS} FROM wireframes WHERE created_by = ?1 ORDER BY id DESC"
        ))
        .bind(&filter.created_by)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records.into_iter().map(WireframeDBResponse::from).collect())
    }
}
