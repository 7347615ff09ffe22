//! Database layer for data persistence and access.
//!
//! Data access uses SQLx over SQLite and follows the repository pattern:
//! API handlers talk to repositories ([`handlers`]), repositories return
//! database records ([`models`]), and every SQLx failure is translated into a
//! [`errors::DbError`] that application code can match on.
//!
//! Repositories are constructed from a `&mut SqliteConnection`, so multi-step
//! operations (the credit-gated wireframe creation in particular) can run
//! inside a single transaction and roll back as a unit.

pub mod errors;
pub mod handlers;
pub mod models;
