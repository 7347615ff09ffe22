//! Repository implementations for database access.

pub mod repository;
pub mod users;
pub mod wireframes;

pub use repository::Repository;
pub use users::Users;
pub use wireframes::Wireframes;
