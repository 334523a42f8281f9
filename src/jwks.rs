use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::jwk::RSAKeyParameters;
use jsonwebtoken::DecodingKey;
use lru::LruCache;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::fetch_jwks_error;
use crate::error::parse_jwks_error;
use crate::error::Error;
use crate::error::Result;

/// Source of the signing key set
///
/// Implemented by [`HttpKeyFetcher`] for the real JWKS endpoint; tests supply
/// fake implementations to drive the [`KeyStore`] deterministically.
#[async_trait]
pub trait FetchKeys: Send + Sync {
    /// Fetch the full key set currently published by the issuer
    async fn fetch(&self) -> Result<JwkSet>;
}

/// Fetches the JWKS document over HTTP with a hard per-request timeout
pub struct HttpKeyFetcher {
    client: Client,
    jwks_uri: String,
    timeout: Duration,
}

impl HttpKeyFetcher {
    pub fn new(client: Client, jwks_uri: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            jwks_uri: jwks_uri.into(),
            timeout,
        }
    }
}

#[async_trait]
impl FetchKeys for HttpKeyFetcher {
    async fn fetch(&self) -> Result<JwkSet> {
        let jwks = self
            .client
            .get(&self.jwks_uri)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(fetch_jwks_error)?
            .error_for_status()
            .map_err(fetch_jwks_error)?
            .json()
            .await
            .map_err(parse_jwks_error)?;

        Ok(jwks)
    }
}

/// LRU-bounded cache of signing keys, keyed by `kid`
///
/// Populated lazily: a miss fetches the entire remote key set and absorbs
/// every key in it, so a single round trip covers provider key rotation.
/// There is no TTL; an unknown `kid` always triggers a refetch, which is what
/// keeps the cache current.
pub struct KeyStore {
    keys: Mutex<LruCache<String, Arc<DecodingKey>>>,
    // Serializes cache-miss refreshes so concurrent misses during a key
    // rotation collapse onto one outbound fetch.
    refresh: Mutex<()>,
    fetcher: Arc<dyn FetchKeys>,
}

impl KeyStore {
    /// Create a key store over the given fetcher, caching at most
    /// `max_cached_keys` keys (a zero cap is treated as one)
    pub fn new(fetcher: Arc<dyn FetchKeys>, max_cached_keys: usize) -> Self {
        let cap = NonZeroUsize::new(max_cached_keys).unwrap_or(NonZeroUsize::MIN);

        Self {
            keys: Mutex::new(LruCache::new(cap)),
            refresh: Mutex::new(()),
            fetcher,
        }
    }

    /// Get the signing key for the given `kid`, fetching the remote key set
    /// on a cache miss
    pub async fn get_or_fetch(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        if let Some(key) = self.lookup(kid).await {
            return Ok(key);
        }

        let _refresh = self.refresh.lock().await;

        // A fetch that completed while we waited for the gate may already
        // have absorbed this kid.
        if let Some(key) = self.lookup(kid).await {
            return Ok(key);
        }

        let jwks = self.fetcher.fetch().await?;

        // Serve the requested key straight from the fetched document; a cache
        // bound smaller than the published set must not evict it before it is
        // returned.
        self.absorb(&jwks, kid)
            .await
            .ok_or_else(|| Error::KeyNotFound(kid.to_string()))
    }

    /// Number of keys currently cached
    pub async fn cached_key_count(&self) -> usize {
        self.keys.lock().await.len()
    }

    async fn lookup(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys.lock().await.get(kid).cloned()
    }

    /// Absorb every usable key from a fetched key set, replacing entries for
    /// rotated `kid`s, and hand back the one matching `wanted` if present
    async fn absorb(&self, jwks: &JwkSet, wanted: &str) -> Option<Arc<DecodingKey>> {
        let mut keys = self.keys.lock().await;
        let mut found = None;

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                debug!("Skipping JWKS entry without a kid");
                continue;
            };

            match &jwk.algorithm {
                AlgorithmParameters::RSA(RSAKeyParameters { n, e, .. }) => {
                    match DecodingKey::from_rsa_components(n, e) {
                        Ok(key) => {
                            let key = Arc::new(key);
                            if kid == wanted {
                                found = Some(Arc::clone(&key));
                            }
                            keys.put(kid, key);
                        }
                        Err(error) => {
                            debug!(kid = %kid, error = %error, "Skipping JWKS entry with unusable RSA components");
                        }
                    }
                }
                other => {
                    debug!(kid = %kid, algorithm = ?other, "Skipping non-RSA JWKS entry");
                }
            }
        }

        found
    }
}
