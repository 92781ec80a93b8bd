//! # Storefront server
//! Hosts the storefront engine as a long-running process. It is responsible for:
//! * Opening the order store and the in-process cache.
//! * Warming the price cache, and resuming order timers that were pending when the process last stopped.
//! * Keeping the cache tidy with a periodic janitor.
//! * Logging every order event for audit purposes.
//!
//! The chat transport plugs in through the engine's `Notifier` trait. Until one is wired, notifications are written to
//! the log by [`notifier::LogNotifier`].
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod janitor;
pub mod notifier;
pub mod server;
