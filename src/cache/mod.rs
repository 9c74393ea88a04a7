//! Bounded response cache for the atomic path.
//!
//! Entries are keyed by a SHA-256 digest of the model identifier and the
//! request messages, expire after a TTL, and the oldest entry is evicted
//! once capacity is reached. Streaming requests are never cached.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ParleyError;
use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use crate::types::FragmentStream;

/// Expiry and size bounds. A capacity of zero disables caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub capacity: usize,
}

impl CachePolicy {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
    pub const DEFAULT_CAPACITY: usize = 128;

    pub fn disabled() -> Self {
        Self {
            ttl: Duration::ZERO,
            capacity: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0 && !self.ttl.is_zero()
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Self::DEFAULT_TTL,
            capacity: Self::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    text: String,
    inserted_at: Instant,
}

/// Content-addressed text cache.
#[derive(Debug)]
pub struct ResponseCache {
    policy: CachePolicy,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Digest of the model id and the request that would be sent.
    pub fn key(model_id: &str, request: &ProviderRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model_id.as_bytes());
        for turn in &request.messages {
            hasher.update([0u8]);
            hasher.update(turn.role().to_string().as_bytes());
            hasher.update([0u8]);
            hasher.update(turn.text().as_bytes());
        }
        if let Ok(settings) = serde_json::to_vec(&request.settings) {
            hasher.update([0u8]);
            hasher.update(settings);
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.policy.ttl => {
                Some(entry.text.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, text: String) {
        if !self.policy.is_enabled() {
            return;
        }
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        let ttl = self.policy.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        if !entries.contains_key(&key) && entries.len() >= self.policy.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!(key = %oldest, "evicting cached response");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                text,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

/// Provider decorator serving repeated atomic requests from a [`ResponseCache`].
pub struct CachedProvider<P: ?Sized = dyn ModelProvider> {
    cache: ResponseCache,
    inner: Box<P>,
}

impl<P: ModelProvider + ?Sized> CachedProvider<P> {
    pub fn new(inner: Box<P>, policy: CachePolicy) -> Self {
        Self {
            cache: ResponseCache::new(policy),
            inner,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[async_trait]
impl<P: ModelProvider + ?Sized> ModelProvider for CachedProvider<P> {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ParleyError> {
        let key = ResponseCache::key(self.inner.model_id(), request);
        if let Some(text) = self.cache.get(&key) {
            debug!(model = self.inner.model_id(), "cache hit");
            return Ok(ProviderResponse { text });
        }

        let response = self.inner.generate_text(request).await?;
        if !response.text.is_empty() {
            self.cache.insert(key, response.text.clone());
        }
        Ok(response)
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<FragmentStream, ParleyError> {
        self.inner.stream_text(request).await
    }
}
