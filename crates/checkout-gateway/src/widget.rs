//! Hosted Payment Widget Protocol
//!
//! The widget is an embedded form served from the provider's origin. We send
//! it one [`WidgetFormMessage`] to show the form, then it reports back with
//! [`WidgetMessage`]s. Messages from any other origin are dropped.
//!
//! ```text
//!          iframeReady      paymentProcessing      paymentStatus
//!   Idle ─────────────▶ Ready ─────────────▶ Processing ─────────────▶ Settled
//!    ▲                                                                   │
//!    └──────────────────────────── retry() ──────────────────────────────┘
//! ```

use checkout_core::{OrderId, PaymentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const DEFAULT_WIDGET_ORIGIN: &str = "https://celalios.com";
const DEFAULT_FAILED_MESSAGE: &str = "Payment failed. Please try again.";
const DEFAULT_VALIDATION_MESSAGE: &str = "Invalid payment details";

/// Origin the widget is served from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetOrigin(String);

impl WidgetOrigin {
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact origin match
    pub fn matches(&self, origin: &str) -> bool {
        self.0 == origin.trim_end_matches('/')
    }
}

impl Default for WidgetOrigin {
    fn default() -> Self {
        Self::new(DEFAULT_WIDGET_ORIGIN)
    }
}

impl std::fmt::Display for WidgetOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefill values for the widget form; everything is optional
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetFields {
    pub cardholder: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvc: String,
    pub amount: String,
    pub currency: Option<String>,
}

/// Outbound message that tells the widget to show its form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetFormMessage {
    pub order_id: OrderId,
    pub cardholder: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvc: String,
    pub amount: String,
    pub currency: String,
    pub show_form: u8,
}

impl WidgetFormMessage {
    pub fn new(order_id: OrderId, fields: WidgetFields) -> Self {
        Self {
            order_id,
            cardholder: fields.cardholder,
            card_number: fields.card_number,
            expiry_date: fields.expiry_date,
            cvc: fields.cvc,
            amount: fields.amount,
            currency: fields
                .currency
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "USD".into()),
            show_form: 1,
        }
    }
}

/// Inbound message from the widget
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WidgetMessage {
    /// Widget loaded and can receive the form message
    IframeReady,

    /// Payer submitted the form
    PaymentProcessing,

    /// Final outcome
    PaymentStatus {
        status: String,
        #[serde(default)]
        message: Option<String>,
    },

    ValidationError {
        #[serde(default)]
        message: Option<String>,
    },

    /// Any other message kind; ignored
    #[serde(other)]
    Other,
}

impl WidgetMessage {
    /// Parse a raw message payload; `None` for anything that is not a widget message
    pub fn parse(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }
}

/// Where a widget session is in its flow
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "status", rename_all = "camelCase")]
pub enum WidgetState {
    Idle,
    Ready,
    Processing,
    Settled(PaymentStatus),
}

/// One embedded-widget checkout
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSession {
    pub session_id: Uuid,
    pub order_id: OrderId,
    pub state: WidgetState,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(skip)]
    origin: WidgetOrigin,
}

impl WidgetSession {
    /// New session with a fresh `order_<uuid>` id; loading until the widget is ready
    pub fn new(origin: WidgetOrigin) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            order_id: OrderId::widget(),
            state: WidgetState::Idle,
            loading: true,
            error: None,
            origin,
        }
    }

    pub const fn origin(&self) -> &WidgetOrigin {
        &self.origin
    }

    /// Form message for the widget, with the target origin it must be posted to
    pub fn form_message(&self, fields: WidgetFields) -> (WidgetFormMessage, &WidgetOrigin) {
        (WidgetFormMessage::new(self.order_id.clone(), fields), &self.origin)
    }

    /// Apply an inbound message
    ///
    /// Returns `false` when the message was dropped: wrong origin, not a
    /// widget message, or a kind we do not handle.
    pub fn handle(&mut self, origin: &str, payload: &Value) -> bool {
        if !self.origin.matches(origin) {
            tracing::debug!(session_id = %self.session_id, origin, "Dropping widget message from foreign origin");
            return false;
        }

        let Some(message) = WidgetMessage::parse(payload) else {
            return false;
        };

        self.apply(message)
    }

    fn apply(&mut self, message: WidgetMessage) -> bool {
        match message {
            WidgetMessage::IframeReady => {
                self.loading = false;
                if self.state == WidgetState::Idle {
                    self.state = WidgetState::Ready;
                }
            }
            WidgetMessage::PaymentProcessing => {
                self.loading = true;
                self.state = WidgetState::Processing;
                self.error = None;
            }
            WidgetMessage::PaymentStatus { status, message } => {
                let status = PaymentStatus::parse(&status);
                self.loading = false;
                if status == PaymentStatus::Failed {
                    self.error = Some(message.unwrap_or_else(|| DEFAULT_FAILED_MESSAGE.into()));
                }
                tracing::info!(order_id = %self.order_id, status = %status, "Widget payment settled");
                self.state = WidgetState::Settled(status);
            }
            WidgetMessage::ValidationError { message } => {
                self.error = Some(message.unwrap_or_else(|| DEFAULT_VALIDATION_MESSAGE.into()));
            }
            WidgetMessage::Other => return false,
        }
        true
    }

    /// Start over with a new order id; the widget is reloaded
    pub fn retry(&mut self) -> &OrderId {
        self.order_id = OrderId::widget();
        self.state = WidgetState::Idle;
        self.loading = true;
        self.error = None;
        &self.order_id
    }
}
