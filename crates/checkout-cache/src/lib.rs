//! # Checkout Cache
//!
//! Status layer between the checkout views and the payment API.
//!
//! - [`ResponseCache`]: TTL cache with request coalescing. Concurrent callers
//!   asking for the same request share one outbound call.
//! - [`OrderStatusTracker`]: per-order status records with a short TTL while
//!   an order is pending.
//! - [`StatusPoller`] / [`StatusMonitor`]: cancellable background refresh for
//!   orders on screen.

pub mod cache;
pub mod poller;
pub mod tracker;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use cache::{CachedResponse, DEFAULT_TTL, ResponseCache, ResponseSource};
pub use poller::{
    MONITOR_DELAY, MonitorConfig, POLL_INTERVAL, PollHandle, PollOutcome, PollerConfig,
    StatusMonitor, StatusPoller,
};
pub use tracker::{OrderStatusTracker, PENDING_TTL, TrackerConfig};
