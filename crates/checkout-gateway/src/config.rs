//! Gateway configuration

use std::time::Duration;

use crate::widget::WidgetOrigin;

const DEFAULT_API_URL: &str = "https://api.vancipay.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Payment provider endpoints and limits
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Provider base URL, without trailing slash
    pub api_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Only origin the hosted widget may talk to us from
    pub widget_origin: WidgetOrigin,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            widget_origin: WidgetOrigin::default(),
        }
    }
}

impl GatewayConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        let api_url = std::env::var("PAYMENT_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.into());
        let timeout_secs = std::env::var("PAYMENT_API_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let widget_origin = std::env::var("WIDGET_ORIGIN")
            .map(WidgetOrigin::new)
            .unwrap_or_default();

        Self {
            timeout_secs,
            widget_origin,
            ..Self::new(api_url)
        }
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Server-to-server payment endpoint
    pub fn pay_url(&self) -> String {
        format!("{}/pay", self.api_url)
    }

    /// Status endpoint; takes the order id as `orderId`
    pub fn status_url(&self) -> String {
        format!("{}/redirect", self.api_url)
    }
}
