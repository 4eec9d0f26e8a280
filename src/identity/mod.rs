//! Token validation against the external identity service.

pub mod cache;
pub mod client;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use cache::TokenCache;
pub use client::HttpIdentityClient;

/// The caller as reported by the identity service's ping endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identity service address: {0}")]
    InvalidAddress(String),

    #[error("Identity service rejected the token with status {0}")]
    Rejected(u16),

    #[error("Identity service unreachable: {0}")]
    Transport(String),

    #[error("Malformed identity response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the user it belongs to.
    async fn validate_token(&self, token: &str) -> Result<Identity, IdentityError>;
}
