//! API request/response models.

pub mod generation;
pub mod users;
pub mod wireframes;
