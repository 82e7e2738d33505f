//! JWT token handling
//!
//! Tokens are HMAC-SHA256 signed. Revocation is server-side: the auth
//! middleware rejects any token whose `iat` precedes the user's last logout,
//! so no refresh tokens or blacklists are stored.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    CreationError(String),
    #[error("Token validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<u64, JwtError> {
        self.sub
            .parse::<u64>()
            .map_err(|_| JwtError::ValidationError("invalid subject claim".to_string()))
    }

    /// True when the token was issued before `logout_at`, i.e. it has been
    /// revoked by a later logout.
    pub fn issued_before(&self, logout_at: DateTime<Utc>) -> bool {
        self.iat < logout_at.timestamp()
    }
}

pub struct JwtService {
    secret: String,
    validity_hours: i64,
}

impl JwtService {
    pub fn new(secret: String, validity_hours: i64) -> Self {
        Self {
            secret,
            validity_hours,
        }
    }

    pub fn generate_access_token(&self, user_id: u64) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.validity_hours)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| JwtError::CreationError(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| JwtError::ValidationError(e.to_string()))
    }
}
