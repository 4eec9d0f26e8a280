use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::{Identity, IdentityError, IdentityProvider, TokenCache};

/// Header carrying the authenticated user's id to downstream handlers.
pub static USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Authenticated caller, available to handlers behind [`authenticate`].
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
}

impl From<Identity> for CurrentUser {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

/// Token validation shared by every protected route.
#[derive(Clone)]
pub struct Gateway {
    identity: Arc<dyn IdentityProvider>,
    cache: Option<Arc<TokenCache>>,
}

impl Gateway {
    /// A zero `cache_ttl` asks the identity service on every request.
    pub fn new(identity: Arc<dyn IdentityProvider>, cache_ttl: Duration) -> Self {
        let cache = (!cache_ttl.is_zero()).then(|| Arc::new(TokenCache::new(cache_ttl)));
        Self { identity, cache }
    }

    pub async fn resolve(&self, token: &str) -> Result<Identity, IdentityError> {
        if let Some(cache) = &self.cache {
            if let Some(identity) = cache.get(token).await {
                return Ok(identity);
            }
        }

        let identity = self.identity.validate_token(token).await?;

        if let Some(cache) = &self.cache {
            cache.insert(token, identity.clone()).await;
        }
        Ok(identity)
    }
}

/// Validates the bearer token with the identity service before the
/// handler runs. On success the request carries a [`CurrentUser`]
/// extension and an `X-USER-ID` header; any client-supplied
/// `X-USER-ID` is discarded first.
pub async fn authenticate(
    State(gateway): State<Gateway>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    request.headers_mut().remove(&USER_ID_HEADER);

    let token = extract_bearer_token(request.headers()).map_err(|reason| {
        tracing::warn!("Rejected {} {}: {}", request.method(), request.uri().path(), reason);
        ApiError::unauthorized("Unauthorized")
    })?;

    let identity = gateway.resolve(token).await.map_err(|e| {
        tracing::warn!("Token validation failed: {}", e);
        ApiError::unauthorized("Unauthorized")
    })?;

    let user = CurrentUser::from(identity);
    let user_id = HeaderValue::from_str(&user.id.to_string())
        .map_err(|_| ApiError::internal_server_error("Failed to forward user identity"))?;

    tracing::debug!("Authenticated user {} ({})", user.name, user.id);
    request.headers_mut().insert(USER_ID_HEADER.clone(), user_id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// The header must be exactly `Bearer <token>`, split on a single space.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        (Some("Bearer"), _, _) => Err("Malformed bearer credentials"),
        _ => Err("Authorization header must use Bearer token format"),
    }
}
