use storefront_engine::{cache::CacheError, LifecycleError, PriceCacheError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("The order store reported an error. {0}")]
    BackendError(#[from] StoreError),
    #[error("The cache reported an error. {0}")]
    CacheError(#[from] CacheError),
    #[error("Could not warm the price cache. {0}")]
    PriceCacheError(#[from] PriceCacheError),
    #[error("Could not resume order timers. {0}")]
    LifecycleError(#[from] LifecycleError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
}
