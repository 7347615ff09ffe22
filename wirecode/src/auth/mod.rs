//! Caller identity handling.
//!
//! The identity provider is an external collaborator: a trusted fronting
//! proxy authenticates the user and forwards the verified email in a
//! configurable header. Handlers receive the identity as an explicit
//! extractor argument - there is no ambient "current user" state.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::db::models::wireframes::WireframeDBResponse;
use crate::errors::{Error, Result};
use crate::AppState;

/// The verified identity of the caller, taken from the trusted proxy header.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub email: String,
}

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header_name = &state.config.auth.proxy_header.header_name;
        let email = parts
            .headers
            .get(header_name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(Error::Unauthenticated)?;

        Ok(CallerIdentity {
            email: email.to_string(),
        })
    }
}

impl CallerIdentity {
    /// Confirm the caller owns the record before a mutation is allowed.
    pub fn ensure_owns(&self, record: &WireframeDBResponse) -> Result<()> {
        if record.created_by != self.email {
            return Err(Error::Forbidden {
                resource: "wireframe".to_string(),
            });
        }
        Ok(())
    }
}
