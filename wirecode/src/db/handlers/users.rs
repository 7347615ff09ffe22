//! Database repository for users and the credit ledger.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

/// Outcome of a conditional debit against a user's balance.
#[derive(Debug, Clone)]
pub enum DebitOutcome {
    /// The debit was applied; carries the updated user row.
    Applied(UserDBResponse),
    /// The debit would have taken the balance below zero; nothing was mutated.
    InsufficientCredits,
}

// Database entity model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub credits: i64,
}

impl From<User> for UserDBResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            credits: user.credits,
        }
    }
}

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Find or create a user by email.
    ///
    /// Idempotent in effect: an existing user is returned unchanged (credits
    /// are never reset to the default grant), a new user is created with the
    /// requested grant. The insert uses `ON CONFLICT DO NOTHING` so two
    /// concurrent ensures for the same email cannot race into a duplicate.
    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn ensure(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        sqlx::query(
            r#"
            INSERT INTO users (name, email, credits)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(request.credits)
        .execute(&mut *self.db)
        .await?;

        self.get_by_email(&request.email).await?.ok_or(DbError::NotFound)
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email, credits FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }

    /// Atomically decrement a user's balance by `amount`.
    ///
    /// The decrement is a single conditional UPDATE guarded by
    /// `credits >= amount`, checked via rows-affected. There is no separate
    /// read-then-write step, so concurrent debits cannot drive the balance
    /// negative.
    ///
    /// With `enforce` false (development-mode override) the debit instead
    /// clamps at zero and never reports insufficient credits.
    #[instrument(skip(self), err)]
    pub async fn debit(&mut self, email: &str, amount: i64, enforce: bool) -> Result<DebitOutcome> {
        let query = if enforce {
            sqlx::query("UPDATE users SET credits = credits - ?1 WHERE email = ?2 AND credits >= ?1")
        } else {
            sqlx::query("UPDATE users SET credits = MAX(credits - ?1, 0) WHERE email = ?2")
        };

        let result = query.bind(amount).bind(email).execute(&mut *self.db).await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing user from a balance too low to debit
            return match self.get_by_email(email).await? {
                Some(_) => Ok(DebitOutcome::InsufficientCredits),
                None => Err(DbError::NotFound),
            };
        }

        let user = self.get_by_email(email).await?.ok_or(DbError::NotFound)?;
        Ok(DebitOutcome::Applied(user))
    }

    /// Administrative top-up: unconditionally add `amount` to the balance.
    #[instrument(skip(self), err)]
    pub async fn credit(&mut self, email: &str, amount: i64) -> Result<UserDBResponse> {
        let result = sqlx::query("UPDATE users SET credits = credits + ?1 WHERE email = ?2")
            .bind(amount)
            .bind(email)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_email(email).await?.ok_or(DbError::NotFound)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, credits)
            VALUES (?1, ?2, ?3)
            RETURNING id, name, email, credits
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(request.credits)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user.into())
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email, credits FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, User>("SELECT id, name, email, credits FROM users ORDER BY id LIMIT ?1 OFFSET ?2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users.into_iter().map(UserDBResponse::from).collect())
    }
}
