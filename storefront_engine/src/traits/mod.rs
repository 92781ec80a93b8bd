//! # Durable storage contracts
//!
//! This module defines the behaviour a durable store needs to expose in order to back the storefront engine.
//!
//! * [`CatalogManagement`] provides read access to games, categories and items.
//! * [`UserManagement`] registers chat users and looks them up.
//! * [`OrderManagement`] stores orders and performs every status write as a compare-and-set on the expected prior
//!   status, so that racing writers can never apply the same transition twice.
//! * [`StorefrontDatabase`] is the composite trait the engine APIs are generic over.
//!
//! Backends are expected to be cheap to clone (typically a connection pool handle).
mod catalog_management;
mod data_objects;
mod order_management;
mod storefront_database;
mod user_management;

pub use catalog_management::CatalogManagement;
pub use data_objects::AssignOutcome;
pub use order_management::OrderManagement;
pub use storefront_database::{StoreError, StorefrontDatabase};
pub use user_management::UserManagement;
