//! # checkout-gateway
//!
//! Everything that talks to the payment provider.
//!
//! - [`HttpTransport`]: the production [`ApiTransport`](checkout_core::ApiTransport),
//!   backed by reqwest
//! - [`PaymentClient`]: server-to-server payment initiation
//! - [`widget`]: message protocol for the hosted payment widget
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_gateway::{GatewayConfig, HttpTransport, PaymentClient};
//!
//! let config = GatewayConfig::from_env();
//! let transport = Arc::new(HttpTransport::new(config.timeout())?);
//! let payments = PaymentClient::new(transport.clone(), config);
//!
//! let initiation = payments.initiate_payment(&request).await?;
//! // Send the payer to: initiation.redirect_url
//! ```

mod client;
mod config;
mod http;
pub mod widget;

pub use client::PaymentClient;
pub use config::GatewayConfig;
pub use http::HttpTransport;
pub use widget::{WidgetFields, WidgetFormMessage, WidgetMessage, WidgetOrigin, WidgetSession, WidgetState};
