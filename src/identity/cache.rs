use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::Identity;

const PRUNE_THRESHOLD: usize = 1024;

/// Short-lived memory of tokens the identity service accepted.
/// Rejections are never stored.
pub struct TokenCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Identity, Instant)>>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, token: &str) -> Option<Identity> {
        self.get_at(token, Instant::now()).await
    }

    pub async fn insert(&self, token: &str, identity: Identity) {
        self.insert_at(token, identity, Instant::now()).await
    }

    async fn get_at(&self, token: &str, now: Instant) -> Option<Identity> {
        let entries = self.entries.read().await;
        entries
            .get(token)
            .filter(|(_, stored)| now.duration_since(*stored) < self.ttl)
            .map(|(identity, _)| identity.clone())
    }

    async fn insert_at(&self, token: &str, identity: Identity, now: Instant) {
        let mut entries = self.entries.write().await;
        if entries.len() >= PRUNE_THRESHOLD && !entries.contains_key(token) {
            let ttl = self.ttl;
            entries.retain(|_, (_, stored)| now.duration_since(*stored) < ttl);
        }
        // Still full of live entries: drop the oldest.
        while entries.len() >= PRUNE_THRESHOLD && !entries.contains_key(token) {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, (_, stored))| *stored)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            entries.remove(&oldest);
        }
        entries.insert(token.to_string(), (identity, now));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
