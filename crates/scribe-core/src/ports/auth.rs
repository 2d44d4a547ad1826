//! Authentication ports.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{User, Viewer};

/// The identity a verified bearer token vouches for.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub fn viewer(&self) -> Viewer {
        Viewer::User(self.user_id)
    }
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    /// Seconds until expiry.
    pub expires_in: u64,
}

pub trait TokenService: Send + Sync {
    fn issue(&self, user: &User) -> Result<IssuedToken, AuthError>;

    /// Decode a token, rejecting bad signatures, foreign issuers and expired
    /// tokens.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}
