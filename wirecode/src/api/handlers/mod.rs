//! Axum route handlers.
//!
//! Handlers are the gateway boundary: they validate every external input,
//! enforce ownership, consult the rate-limit policy points, and translate
//! repository/orchestrator outcomes into the error taxonomy in
//! [`crate::errors`]. Nothing below this layer produces an HTTP response.

use crate::errors::{Error, Result};

pub mod export;
pub mod generation;
pub mod users;
pub mod wireframes;

/// Fail with `MissingFields` naming every absent or empty field, not just
/// the first one.
pub(crate) fn require_fields(fields: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingFields { fields: missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_every_missing_field() {
        let err = require_fields(&[("uid", "frame-1"), ("description", ""), ("imageUrl", "  "), ("model", "")]).unwrap_err();

        match err {
            Error::MissingFields { fields } => {
                assert_eq!(fields, vec!["description", "imageUrl", "model"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn passes_when_all_present() {
        assert!(require_fields(&[("uid", "frame-1"), ("email", "a@b.com")]).is_ok());
    }
}
