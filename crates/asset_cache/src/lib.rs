//! Versioned asset cache with install/intercept/activate lifecycle.

pub mod cache;

pub use cache::{
    AssetCacheManager, AssetFetcher, CacheError, CacheStorage, CachedAsset, FetchError,
    OriginFetcher, RequestMode,
};
