//! Helpers for tests: database preparation, catalog seeding and test doubles for the clock, the notifier, the cache
//! and the catalog. Enabled with the `test_utils` feature.
pub mod flaky_cache;
pub mod manual_clock;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
pub mod recording_notifier;
#[cfg(feature = "sqlite")]
pub mod seed;
pub mod stub_catalog;
