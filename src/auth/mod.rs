//! Resolving bearer credentials to user identities.
//!
//! The hub only ever sees the [`UserId`] an [`AuthValidator`] returns; raw
//! credentials stop at the upgrade handler.

pub mod jwt;

use thiserror::Error;

use crate::hub::message::UserId;

pub use jwt::{Claims, JwtValidator};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredential,
    #[error("authorization header is not a bearer credential")]
    MalformedHeader,
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("failed to issue token: {0}")]
    Issue(#[source] jsonwebtoken::errors::Error),
}

/// Resolves a bearer token to the user it was issued for.
pub trait AuthValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<UserId, AuthError>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests;
