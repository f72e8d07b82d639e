//! Server-to-server payment client

use std::sync::Arc;

use checkout_core::{ApiTransport, PaymentInitiation, PaymentRequest, RequestDescriptor, Result};

use crate::config::GatewayConfig;

/// Payment provider client
///
/// Payment initiation goes straight to the transport. It is a side effect
/// and is never cached or coalesced.
pub struct PaymentClient {
    transport: Arc<dyn ApiTransport>,
    config: GatewayConfig,
}

impl PaymentClient {
    pub fn new(transport: Arc<dyn ApiTransport>, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Endpoint the status tracker should query
    pub fn status_url(&self) -> String {
        self.config.status_url()
    }

    /// Submit a payment; the response usually carries a redirect URL
    pub async fn initiate_payment(&self, request: &PaymentRequest) -> Result<PaymentInitiation> {
        let descriptor = RequestDescriptor::post_json(self.config.pay_url(), serde_json::to_value(request)?);

        tracing::info!(
            order_id = %request.order_id,
            amount = %request.amount,
            currency = %request.currency,
            transport = self.transport.name(),
            "Initiating payment"
        );

        let body = self.transport.execute(&descriptor).await.inspect_err(|e| {
            tracing::error!(order_id = %request.order_id, error = %e, "Payment initiation failed");
        })?;

        let initiation: PaymentInitiation = serde_json::from_value(body)?;
        if initiation.redirect_url.is_none() {
            tracing::warn!(order_id = %request.order_id, "Payment initiated without redirect URL");
        }

        Ok(initiation)
    }
}
