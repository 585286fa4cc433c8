use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, AuthValidator};
use crate::config::AuthSettings;
use crate::hub::message::UserId;

/// Claims carried by tokens the account service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub username: String,
    pub exp: usize,
}

/// HS256 bearer tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl JwtValidator {
    pub fn new(settings: &AuthSettings) -> Self {
        let secret = settings.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs: settings.token_ttl_secs,
        }
    }

    /// Mints a token for `user_id` that expires after the configured TTL.
    pub fn issue(&self, user_id: UserId, username: &str) -> Result<String, AuthError> {
        let exp = (Utc::now().timestamp().max(0) as u64).saturating_add(self.ttl_secs);
        self.issue_with_expiry(user_id, username, usize::try_from(exp).unwrap_or(usize::MAX))
    }

    /// Mints a token with an explicit `exp` (seconds since the Unix epoch).
    pub fn issue_with_expiry(
        &self,
        user_id: UserId,
        username: &str,
        exp: usize,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            user_id,
            username: username.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Issue)
    }

    pub fn claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::Invalid)
    }
}

impl AuthValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<UserId, AuthError> {
        self.claims(token).map(|claims| claims.user_id)
    }
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
