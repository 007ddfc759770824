use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// A stored response: what gets served back for a cached request key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// How the client is asking for the asset. Navigations get the shell
/// fallback when offline; sub-resources fail visibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Asset,
}

#[derive(Error, Debug)]
#[error("{0}")]
pub struct FetchError(pub String);

#[derive(Error, Debug)]
pub enum CacheError {
    /// A manifest asset could not be fetched during install. No store is
    /// left behind.
    #[error("install failed for {key}: {reason}")]
    InstallFailed { key: String, reason: String },

    /// Activate was requested for a version whose install never completed.
    #[error("store {0} is not installed")]
    NotInstalled(String),

    /// Cache miss and the live fetch failed, with no applicable fallback.
    #[error("fetch failed for {key}: {reason}")]
    FetchFailed { key: String, reason: String },

    /// Navigation fallback was needed but no shell document is cached.
    #[error("no cached shell available")]
    NoShell,
}

/// Live source of assets behind the cache: the network, from the cache's
/// point of view.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<CachedAsset, FetchError>;
}

/// Process-wide set of named asset stores plus the single identifier of the
/// store currently authoritative for lookups. Stores are only ever inserted
/// as a complete set and deleted whole.
#[derive(Default)]
pub struct CacheStorage {
    stores: RwLock<HashMap<String, HashMap<String, CachedAsset>>>,
    active: RwLock<Option<String>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every store, current and condemned.
    pub async fn keys(&self) -> Vec<String> {
        self.stores.read().await.keys().cloned().collect()
    }

    pub async fn contains_store(&self, name: &str) -> bool {
        self.stores.read().await.contains_key(name)
    }

    /// Name of the store lookups are served from, if any version has been
    /// activated yet.
    pub async fn active(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    async fn put_store(&self, name: &str, entries: HashMap<String, CachedAsset>) {
        self.stores.write().await.insert(name.to_string(), entries);
    }

    async fn delete(&self, name: &str) -> bool {
        self.stores.write().await.remove(name).is_some()
    }

    async fn set_active(&self, name: &str) {
        *self.active.write().await = Some(name.to_string());
    }

    /// Looks `key` up in the active store. The asset is cloned out under
    /// the read lock, so a concurrent store deletion cannot tear the read.
    async fn lookup_active(&self, key: &str) -> Option<CachedAsset> {
        let active = self.active.read().await;
        let name = active.as_deref()?;
        let stores = self.stores.read().await;
        stores.get(name)?.get(key).cloned()
    }
}

/// Lifecycle manager for one cache version: install the manifest, serve
/// intercepted requests cache-first, and on activation condemn every other
/// store version. The version tag in the store name is the sole
/// cache-busting mechanism.
pub struct AssetCacheManager<F> {
    version: String,
    manifest: Vec<String>,
    shell_key: String,
    storage: Arc<CacheStorage>,
    fetcher: F,
}

impl<F: AssetFetcher> AssetCacheManager<F> {
    pub fn new(
        version: &str,
        manifest: Vec<String>,
        shell_key: &str,
        storage: Arc<CacheStorage>,
        fetcher: F,
    ) -> Self {
        return AssetCacheManager {
            version: version.to_string(),
            manifest,
            shell_key: shell_key.to_string(),
            storage,
            fetcher,
        };
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Populates this version's store with the full manifest. All-or-nothing:
    /// the store is only inserted once every asset has been fetched, so a
    /// failed install leaves nothing queryable.
    pub async fn install(&self) -> Result<(), CacheError> {
        let mut entries = HashMap::new();
        for key in &self.manifest {
            debug!("install | version: {} | key: {}", self.version, key);
            match self.fetcher.fetch(key).await {
                Ok(asset) => {
                    entries.insert(key.clone(), asset);
                }
                Err(err) => {
                    return Err(CacheError::InstallFailed {
                        key: key.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        self.storage.put_store(&self.version, entries).await;
        info!(
            "install | version: {} | cached {} assets",
            self.version,
            self.manifest.len()
        );
        Ok(())
    }

    /// Takes over as the authoritative version: deletes every store with a
    /// different version tag, then swaps lookups to this store. The swap
    /// happens only after cleanup, so in-flight intercepts keep a valid
    /// store until activation finishes. Refuses when install has not
    /// completed for this version.
    pub async fn activate(&self) -> Result<(), CacheError> {
        if !self.storage.contains_store(&self.version).await {
            return Err(CacheError::NotInstalled(self.version.clone()));
        }

        for name in self.storage.keys().await {
            if name != self.version {
                debug!("activate | deleting condemned store: {}", name);
                self.storage.delete(&name).await;
            }
        }

        self.storage.set_active(&self.version).await;
        info!("activate | version: {} is now current", self.version);
        Ok(())
    }

    /// Serves one asset request. Cache hit in the active store wins without
    /// touching the network; a miss is fetched live; a failed live fetch
    /// falls back to the cached shell for navigations and fails visibly for
    /// anything else.
    pub async fn intercept(
        &self,
        key: &str,
        mode: RequestMode,
    ) -> Result<CachedAsset, CacheError> {
        if let Some(asset) = self.storage.lookup_active(key).await {
            debug!("intercept | cache hit | key: {}", key);
            return Ok(asset);
        }

        debug!("intercept | cache miss | key: {}", key);
        match self.fetcher.fetch(key).await {
            Ok(asset) => Ok(asset),
            Err(err) => {
                if mode == RequestMode::Navigate {
                    return match self.storage.lookup_active(&self.shell_key).await {
                        Some(shell) => Ok(shell),
                        None => Err(CacheError::NoShell),
                    };
                }
                Err(CacheError::FetchFailed {
                    key: key.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Network-backed fetcher: relative keys resolve against the configured
/// asset origin, absolute URLs (CDN assets) are fetched verbatim.
pub struct OriginFetcher {
    origin: String,
    client: reqwest::Client,
}

impl OriginFetcher {
    pub fn new(origin: &str) -> Self {
        return OriginFetcher {
            origin: origin.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        };
    }
}

#[async_trait]
impl AssetFetcher for OriginFetcher {
    async fn fetch(&self, key: &str) -> Result<CachedAsset, FetchError> {
        let url = if key.starts_with("http://") || key.starts_with("https://") {
            key.to_string()
        } else {
            format!("{}{}", self.origin, key)
        };

        debug!("fetch | url: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FetchError(format!("status {} for {}", response.status(), url)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError(e.to_string()))?
            .to_vec();

        Ok(CachedAsset { content_type, body })
    }
}
