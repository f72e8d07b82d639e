//! # checkout-core
//!
//! Domain types shared by the checkout status layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      checkout-server                          │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────────┐  │
//! │  │  OrderStore  │  │ StatusTracker  │──│  ApiTransport    │  │
//! │  │ (order book) │  │ + ResponseCache│  │  (Strategy)      │  │
//! │  └──────────────┘  └────────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ApiTransport` trait lets the cache run against the real payment API
//! (reqwest, in `checkout-gateway`) or a scripted transport in tests.

pub mod card;
pub mod error;
pub mod model;
pub mod order;
pub mod transport;

pub use error::{CheckoutError, Result};
pub use model::{
    OrderId, OrderStatusRecord, PaymentInitiation, PaymentRequest, PaymentStatus, StatusResponse,
};
pub use order::{MemoryOrderStore, Order, OrderQuery, OrderStore, SortDirection, SortKey};
pub use transport::{ApiTransport, CacheKey, Method, RequestDescriptor};
