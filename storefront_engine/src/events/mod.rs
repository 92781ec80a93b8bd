//! Order lifecycle events.
//!
//! Subscribers register async hooks in [`EventHooks`]. [`EventHandlers`] turns them into background handlers, and
//! the [`EventProducers`] it hands out are given to the order lifecycle, which publishes an event whenever an order is
//! created or changes status.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
