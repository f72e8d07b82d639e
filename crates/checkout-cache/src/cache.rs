//! Response Cache
//!
//! Caches API responses per `CacheKey` with a per-entry expiry and coalesces
//! concurrent identical requests into a single outbound call.
//!
//! ```text
//!  fetch_with_cache(req, force, ttl)
//!        │
//!        ├─ !force && fresh entry ──────────▶ cached body (no I/O)
//!        ├─ request in flight for key ──────▶ join it
//!        └─ otherwise ── spawn request ─────▶ store {body, now + ttl}
//!                                              then clear in-flight marker
//! ```
//!
//! The outbound request runs on its own task: it settles, caches and clears
//! its marker even if every caller has stopped waiting. Failures are never
//! cached. No timeout is applied here; a request that never settles keeps
//! its key in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use checkout_core::{ApiTransport, CacheKey, CheckoutError, RequestDescriptor, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

/// Default time-to-live of a cached response (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Response body shared by every caller that observed it
pub type ResponseBody = Arc<Value>;

type InFlight = Shared<BoxFuture<'static, Result<ResponseBody>>>;

/// Where a response came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from a fresh cache entry, no I/O
    Cache,
    /// This call started the outbound request
    Network,
    /// This call joined a request another caller started
    Coalesced,
}

#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub body: ResponseBody,
    pub source: ResponseSource,
}

struct CacheEntry {
    data: ResponseBody,
    expires_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    pending: HashMap<CacheKey, InFlight>,
}

impl CacheState {
    /// Fresh body for `key`; an expired entry is pruned here
    fn fresh(&mut self, key: &CacheKey, now: Instant) -> Option<ResponseBody> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(Arc::clone(&entry.data)),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }
}

/// Clears the in-flight marker when the request task ends, panics included
struct PendingGuard {
    state: Arc<Mutex<CacheState>>,
    key: CacheKey,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.state.lock().pending.remove(&self.key);
    }
}

/// Response cache with request coalescing
pub struct ResponseCache {
    transport: Arc<dyn ApiTransport>,
    state: Arc<Mutex<CacheState>>,
}

impl ResponseCache {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Fetch with the default TTL, using the cache when possible
    pub async fn fetch(&self, request: &RequestDescriptor) -> Result<CachedResponse> {
        self.fetch_with_cache(request, false, DEFAULT_TTL).await
    }

    /// Fetch through the cache
    ///
    /// `force_refresh` skips the cached entry but still joins a request that
    /// is already in flight. When two calls race on one key, the call that
    /// started the request decides the TTL.
    pub async fn fetch_with_cache(
        &self,
        request: &RequestDescriptor,
        force_refresh: bool,
        ttl: Duration,
    ) -> Result<CachedResponse> {
        let key = request.cache_key();

        let (in_flight, source) = {
            let mut state = self.state.lock();

            if !force_refresh {
                if let Some(body) = state.fresh(&key, Instant::now()) {
                    tracing::trace!(key = %key, "Cache hit");
                    return Ok(CachedResponse {
                        body,
                        source: ResponseSource::Cache,
                    });
                }
            }

            if let Some(pending) = state.pending.get(&key) {
                tracing::debug!(key = %key, "Joining in-flight request");
                (pending.clone(), ResponseSource::Coalesced)
            } else {
                let in_flight = self.dispatch(key.clone(), request.clone(), ttl);
                state.pending.insert(key, in_flight.clone());
                (in_flight, ResponseSource::Network)
            }
        };

        let body = in_flight.await?;
        Ok(CachedResponse { body, source })
    }

    /// Spawn the outbound request for `key`
    ///
    /// Called with the state lock held; the task only takes the lock after
    /// the transport settles.
    fn dispatch(&self, key: CacheKey, request: RequestDescriptor, ttl: Duration) -> InFlight {
        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);

        tracing::debug!(
            key = %key,
            transport = transport.name(),
            ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            "Dispatching request"
        );

        let task = tokio::spawn(async move {
            let guard = PendingGuard {
                state: Arc::clone(&state),
                key,
            };

            let outcome = transport.execute(&request).await.map(Arc::new);

            match &outcome {
                Ok(body) => {
                    state.lock().entries.insert(
                        guard.key.clone(),
                        CacheEntry {
                            data: Arc::clone(body),
                            expires_at: Instant::now() + ttl,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(key = %guard.key, error = %e, "Request failed, not cached");
                }
            }

            drop(guard);
            outcome
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(CheckoutError::Transport(format!("request task ended: {e}"))))
        }
        .boxed()
        .shared()
    }

    /// Drop the entry for one key; an in-flight request is left alone
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Whether a request for `key` is currently in flight
    pub fn in_flight(&self, key: &CacheKey) -> bool {
        self.state.lock().pending.contains_key(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Whether a non-expired entry exists for `key` (does not prune)
    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Stored entries, expired ones included until they are next looked up
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}
