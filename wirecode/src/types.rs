//! Shared identifier types.

pub type UserId = i64;
pub type WireframeId = i64;
