//! Payment Domain Model
//!
//! Order identifiers, payment statuses and the typed request/response shapes
//! of the external payment API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique order identifier, stable for the lifetime of an order
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate an id for a server-to-server payment
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Generate an id for a hosted widget payment (`order_<uuid>`)
    pub fn widget() -> Self {
        Self(format!("order_{}", Uuid::new_v4()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Payment status reported by the status endpoint
///
/// The API speaks a closed set of three values. Anything else is carried as
/// `Unrecognized` so it is neither treated as final nor as pending.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Unrecognized(String),
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" => Self::Pending,
            "success" => Self::Success,
            "failed" => Self::Failed,
            _ => Self::Unrecognized(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Unrecognized(s) => s,
        }
    }

    /// Terminal status: no further transition is expected
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Body of the payment initiation endpoint (server-to-server flow)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub card_holder_name: String,
    /// Digits only
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    #[serde(rename = "cardCVC")]
    pub card_cvc: String,
    /// Sent as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// Response of the payment initiation endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    /// Where the payer should be sent to complete the payment
    #[serde(default)]
    pub redirect_url: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Response of the status endpoint
///
/// A body without a string `status` is not an error: it simply carries no
/// update for the order.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusResponse {
    pub status: Option<PaymentStatus>,
    pub message: Option<String>,
    /// The body exactly as the endpoint returned it
    pub raw: Arc<Value>,
}

impl StatusResponse {
    pub fn from_body(raw: Arc<Value>) -> Self {
        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(PaymentStatus::parse);
        let message = raw
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            status,
            message,
            raw,
        }
    }
}

/// Latest known status of one order
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusRecord {
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub message: Option<String>,
    pub last_updated: DateTime<Utc>,
    is_final: bool,
}

impl OrderStatusRecord {
    /// Build a record; `is_final` is always derived from `status`
    pub fn new(
        order_id: OrderId,
        status: PaymentStatus,
        message: Option<String>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let is_final = status.is_final();
        Self {
            order_id,
            status,
            message,
            last_updated,
            is_final,
        }
    }

    pub const fn is_final(&self) -> bool {
        self.is_final
    }
}
