use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use super::{Identity, IdentityError, IdentityProvider};
use crate::config::AuthConfig;

const PING_PATH: &str = "ping";

/// Calls `GET {addr}/ping` with the caller's bearer token.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: reqwest::Client,
    ping_url: Url,
}

impl HttpIdentityClient {
    pub fn new(config: &AuthConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            ping_url: ping_url(&config.addr)?,
        })
    }

    pub fn ping_url(&self) -> &Url {
        &self.ping_url
    }
}

fn ping_url(addr: &str) -> Result<Url, IdentityError> {
    let base = format!("{}/", addr.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|base| base.join(PING_PATH))
        .map_err(|_| IdentityError::InvalidAddress(addr.to_string()))
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    async fn validate_token(&self, token: &str) -> Result<Identity, IdentityError> {
        let response = self
            .client
            .get(self.ping_url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Identity service answered {}: {}", status, body);
            return Err(IdentityError::Rejected(status.as_u16()));
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| IdentityError::Malformed(e.to_string()))
    }
}
