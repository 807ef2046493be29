//! The deferred-delivery queue.
//!
//! `payload` defines what gets sent, `dedup` and `registry` the bookkeeping,
//! and `service` the two operations everything hangs off: dispatching a
//! payload and reacting to a membership event.

mod dedup;
mod payload;
mod registry;
mod service;

pub use dedup::RecentEventCache;
pub use payload::{DeferredSend, Payload};
pub use registry::PendingRegistry;
pub use service::{DeliveryService, DeliveryStats};
