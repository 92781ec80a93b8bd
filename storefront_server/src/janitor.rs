use std::time::Duration;

use log::*;
use storefront_engine::cache::Cache;
use tokio::task::JoinHandle;

/// Starts the cache janitor, which drops expired cache keys every `interval`. Do not await the returned JoinHandle,
/// as it will run indefinitely.
pub fn start_cache_janitor(cache: Cache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🧊️ Cache janitor started");
        loop {
            timer.tick().await;
            match cache.purge_expired().await {
                Ok(0) => trace!("🧊️ No expired cache keys"),
                Ok(n) => debug!("🧊️ {n} expired cache keys purged"),
                Err(e) => error!("🧊️ Error purging expired cache keys: {e}"),
            }
        }
    })
}
