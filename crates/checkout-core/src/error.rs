//! Error Types

use thiserror::Error;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout error types
///
/// Every variant owns its data so the error can be cloned and handed to
/// each caller that joined the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Network unreachable, connection reset, timeout at the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success HTTP status
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16 },

    /// Response body was not valid JSON
    #[error("Decode error: {0}")]
    Decode(String),

    /// Payment form or request rejected before submission
    #[error("Validation error: {0}")]
    Validation(String),

    /// Order not present in the order book
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Hosted widget protocol violation
    #[error("Widget error: {0}")]
    Widget(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl CheckoutError {
    /// Check if a later call may succeed where this one failed
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short machine-readable code for API responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Decode(_) => "decode",
            Self::Validation(_) => "validation",
            Self::OrderNotFound(_) => "order_not_found",
            Self::Widget(_) => "widget",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } | Self::Decode(_) => {
                "Payment service is unreachable. Please try again.".into()
            }
            Self::Validation(msg) => format!("Invalid payment details: {msg}"),
            Self::OrderNotFound(id) => format!("Order {id} was not found."),
            Self::Widget(_) => "The payment form reported an error.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<anyhow::Error> for CheckoutError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
