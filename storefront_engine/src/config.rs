use std::time::Duration;

use log::*;
use storefront_common::{env_duration_millis, env_duration_secs};

pub const DEFAULT_CART_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_EXECUTOR_RETRY_DELAY: Duration = Duration::from_secs(300);
pub const DEFAULT_CACHE_OP_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_CACHE_JANITOR_INTERVAL: Duration = Duration::from_secs(60);

/// Cart quantities are clamped to this value.
pub const MAX_ITEM_QUANTITY: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Idle time after which a cart is forgotten.
    pub cart_ttl: Duration,
    /// How long a category listing may be served from the cache.
    pub catalog_ttl: Duration,
    /// The time a client has to pay after creating an order.
    pub payment_timeout: Duration,
    /// Delay before the single retry when no executor was free.
    pub executor_retry_delay: Duration,
    /// Upper bound for any single cache operation.
    pub cache_op_timeout: Duration,
    /// How often expired cache keys are purged.
    pub cache_janitor_interval: Duration,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            cart_ttl: DEFAULT_CART_TTL,
            catalog_ttl: DEFAULT_CATALOG_TTL,
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
            executor_retry_delay: DEFAULT_EXECUTOR_RETRY_DELAY,
            cache_op_timeout: DEFAULT_CACHE_OP_TIMEOUT,
            cache_janitor_interval: DEFAULT_CACHE_JANITOR_INTERVAL,
        }
    }
}

impl StorefrontConfig {
    pub fn from_env_or_default() -> Self {
        let config = Self {
            cart_ttl: env_duration_secs("SF_CART_TTL", DEFAULT_CART_TTL),
            catalog_ttl: env_duration_secs("SF_CATALOG_TTL", DEFAULT_CATALOG_TTL),
            payment_timeout: env_duration_secs("SF_PAYMENT_TIMEOUT", DEFAULT_PAYMENT_TIMEOUT),
            executor_retry_delay: env_duration_secs("SF_EXECUTOR_RETRY_DELAY", DEFAULT_EXECUTOR_RETRY_DELAY),
            cache_op_timeout: env_duration_millis("SF_CACHE_OP_TIMEOUT_MS", DEFAULT_CACHE_OP_TIMEOUT),
            cache_janitor_interval: env_duration_secs("SF_CACHE_JANITOR_INTERVAL", DEFAULT_CACHE_JANITOR_INTERVAL),
        };
        if config.payment_timeout.is_zero() {
            warn!("🪛️ SF_PAYMENT_TIMEOUT is zero. Every unpaid order will be cancelled straight away.");
        }
        config
    }
}
