//! Database record structures matching table schemas.

pub mod users;
pub mod wireframes;
