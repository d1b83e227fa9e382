//! Caller identity.
//!
//! The fronting session layer authenticates the browser session and forwards
//! the signed-in user's email in `x-authenticated-email`. Handlers receive it
//! as an explicit `Caller` value and pass it on; nothing reads it ambiently.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const IDENTITY_HEADER: &str = "x-authenticated-email";

/// The signed-in user making the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    email: String,
}

impl Caller {
    /// Normalizes the email; blank input means no identity.
    pub fn from_email(email: &str) -> Option<Self> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            None
        } else {
            Some(Self { email })
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Rejects with 401 when no identity is present. Use `Option<Caller>` for
/// endpoints that also serve anonymous callers.
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Caller::from_email)
            .ok_or(AppError::Unauthorized)
    }
}
