//! Order Status Tracker
//!
//! Per-order payment status on top of the response cache: adaptive TTL,
//! a record of the last known status, and the polling decision.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use checkout_core::{
    ApiTransport, OrderId, OrderStatusRecord, PaymentStatus, RequestDescriptor, Result,
    StatusResponse,
};

use crate::cache::{DEFAULT_TTL, ResponseCache, ResponseSource};

/// TTL for orders whose last known status is `Pending`
pub const PENDING_TTL: Duration = Duration::from_secs(5);

/// Tracker configuration
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Status endpoint; the order id is sent as the `orderId` query parameter
    pub status_url: String,

    pub pending_ttl: Duration,

    pub default_ttl: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            status_url: "https://api.vancipay.com/redirect".into(),
            pending_ttl: PENDING_TTL,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl TrackerConfig {
    pub fn with_status_url(status_url: impl Into<String>) -> Self {
        Self {
            status_url: status_url.into(),
            ..Default::default()
        }
    }

    /// The status request for an order; its cache key is the order's key
    pub fn status_request(&self, order_id: &OrderId) -> RequestDescriptor {
        RequestDescriptor::get(format!("{}?orderId={}", self.status_url, order_id))
    }
}

/// Tracks the latest known payment status per order
pub struct OrderStatusTracker {
    cache: Arc<ResponseCache>,
    records: RwLock<HashMap<OrderId, OrderStatusRecord>>,
    config: TrackerConfig,
}

impl OrderStatusTracker {
    pub fn new(cache: Arc<ResponseCache>, config: TrackerConfig) -> Self {
        Self {
            cache,
            records: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Tracker with its own response cache
    pub fn from_transport(transport: Arc<dyn ApiTransport>, config: TrackerConfig) -> Self {
        Self::new(Arc::new(ResponseCache::new(transport)), config)
    }

    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Short TTL while the order is known to be pending
    fn ttl_for(&self, order_id: &OrderId) -> Duration {
        match self.records.read().get(order_id) {
            Some(record) if record.status.is_pending() => self.config.pending_ttl,
            _ => self.config.default_ttl,
        }
    }

    /// Fetch an order's status through the cache
    ///
    /// A body without a status leaves the record untouched. A response served
    /// from the cache does not rewrite an existing record, so `last_updated`
    /// only moves when the endpoint actually answered. Only transport
    /// failures are returned as errors.
    pub async fn fetch_transaction_status(
        &self,
        order_id: &OrderId,
        force_refresh: bool,
    ) -> Result<StatusResponse> {
        let request = self.config.status_request(order_id);
        let ttl = self.ttl_for(order_id);

        let response = self
            .cache
            .fetch_with_cache(&request, force_refresh, ttl)
            .await?;
        let status = StatusResponse::from_body(response.body);

        if let Some(new_status) = &status.status {
            let mut records = self.records.write();
            if response.source != ResponseSource::Cache || !records.contains_key(order_id) {
                let record = OrderStatusRecord::new(
                    order_id.clone(),
                    new_status.clone(),
                    status.message.clone(),
                    Utc::now(),
                );
                tracing::debug!(
                    order_id = %order_id,
                    status = %record.status,
                    is_final = record.is_final(),
                    source = ?response.source,
                    "Status record updated"
                );
                records.insert(order_id.clone(), record);
            }
        } else {
            tracing::debug!(order_id = %order_id, "Status response without status, keeping prior state");
        }

        Ok(status)
    }

    /// Whether the poller should keep fetching this order
    pub fn should_poll_status(&self, order_id: &OrderId) -> bool {
        let records = self.records.read();
        let Some(record) = records.get(order_id) else {
            return true;
        };

        if record.is_final() {
            return false;
        }

        record.status == PaymentStatus::Pending
    }

    /// Last known record, regardless of cache expiry
    pub fn get_cached_status(&self, order_id: &OrderId) -> Option<OrderStatusRecord> {
        self.records.read().get(order_id).cloned()
    }

    /// Human-readable age of the last update: `12s ago`, `4m ago`, `2h ago`
    pub fn last_checked(&self, order_id: &OrderId, now: DateTime<Utc>) -> Option<String> {
        let record = self.get_cached_status(order_id)?;
        let secs = (now - record.last_updated).num_seconds().max(0);

        Some(if secs < 60 {
            format!("{secs}s ago")
        } else if secs < 3600 {
            format!("{}m ago", secs / 60)
        } else {
            format!("{}h ago", secs / 3600)
        })
    }

    /// Forget the cached response and the record of one order
    pub fn clear_order_cache(&self, order_id: &OrderId) {
        let key = self.config.status_request(order_id).cache_key();
        self.cache.invalidate(&key);
        self.records.write().remove(order_id);
        tracing::debug!(order_id = %order_id, "Cleared order cache");
    }

    /// Forget every cached response and every record
    pub fn clear_all_cache(&self) {
        self.cache.clear();
        self.records.write().clear();
        tracing::info!("Cleared all cached statuses");
    }

    /// Number of orders with a record
    pub fn tracked_count(&self) -> usize {
        self.records.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MockTransport;
    use checkout_core::CheckoutError;
    use serde_json::json;

    const STATUS_URL: &str = "https://api.test/redirect";

    fn setup() -> (Arc<MockTransport>, OrderStatusTracker) {
        let transport = Arc::new(MockTransport::new());
        let tracker =
            OrderStatusTracker::from_transport(transport.clone(), TrackerConfig::with_status_url(STATUS_URL));
        (transport, tracker)
    }

    fn url(order: &str) -> String {
        format!("{STATUS_URL}?orderId={order}")
    }

    #[tokio::test]
    async fn test_success_makes_order_final() {
        let (transport, tracker) = setup();
        transport.respond(&url("abc123"), json!({ "status": "Success" }));
        let id = OrderId::from("abc123");

        assert!(tracker.should_poll_status(&id));

        let response = tracker.fetch_transaction_status(&id, false).await.unwrap();
        assert_eq!(response.status, Some(PaymentStatus::Success));

        let record = tracker.get_cached_status(&id).unwrap();
        assert_eq!(record.status, PaymentStatus::Success);
        assert!(record.is_final());
        assert!(!tracker.should_poll_status(&id));
    }

    #[tokio::test]
    async fn test_should_poll_decisions() {
        let (transport, tracker) = setup();
        transport.respond(&url("p"), json!({ "status": "Pending" }));
        transport.respond(&url("f"), json!({ "status": "Failed", "message": "Card declined" }));
        transport.respond(&url("r"), json!({ "status": "Refunded" }));

        for id in ["p", "f", "r"] {
            tracker.fetch_transaction_status(&id.into(), false).await.unwrap();
        }

        assert!(tracker.should_poll_status(&"p".into()));
        assert!(!tracker.should_poll_status(&"f".into()));
        assert!(!tracker.should_poll_status(&"r".into()));
        assert!(tracker.should_poll_status(&"unknown".into()));

        let failed = tracker.get_cached_status(&"f".into()).unwrap();
        assert_eq!(failed.message.as_deref(), Some("Card declined"));
    }

    #[tokio::test]
    async fn test_response_without_status_keeps_prior_state() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.respond(&url("o-1"), json!({ "status": "Pending" }));
        transport.respond(&url("o-1"), json!({ "message": "try later" }));

        tracker.fetch_transaction_status(&id, false).await.unwrap();
        let before = tracker.get_cached_status(&id).unwrap();

        let response = tracker.fetch_transaction_status(&id, true).await.unwrap();
        assert!(response.status.is_none());
        assert_eq!(response.message.as_deref(), Some("try later"));
        assert_eq!(tracker.get_cached_status(&id).unwrap(), before);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.fail(&url("o-1"), CheckoutError::HttpStatus { status: 500 });

        let err = tracker.fetch_transaction_status(&id, false).await.unwrap_err();
        assert_eq!(err, CheckoutError::HttpStatus { status: 500 });
        assert!(tracker.get_cached_status(&id).is_none());
        assert!(tracker.should_poll_status(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_does_not_touch_record() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.respond(&url("o-1"), json!({ "status": "Pending" }));

        tracker.fetch_transaction_status(&id, false).await.unwrap();
        let first = tracker.get_cached_status(&id).unwrap();

        let again = tracker.fetch_transaction_status(&id, false).await.unwrap();
        assert_eq!(again.status, Some(PaymentStatus::Pending));
        assert_eq!(transport.calls(), 1);
        assert_eq!(tracker.get_cached_status(&id).unwrap().last_updated, first.last_updated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_orders_use_short_ttl() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.respond(&url("o-1"), json!({ "status": "Pending" }));

        // No record yet: the first answer is cached with the default TTL
        tracker.fetch_transaction_status(&id, false).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        tracker.fetch_transaction_status(&id, false).await.unwrap();
        assert_eq!(transport.calls(), 1);

        // Known pending: refreshed answers live for five seconds
        tracker.fetch_transaction_status(&id, true).await.unwrap();
        assert_eq!(transport.calls(), 2);

        tokio::time::advance(Duration::from_secs(4)).await;
        tracker.fetch_transaction_status(&id, false).await.unwrap();
        assert_eq!(transport.calls(), 2);

        tokio::time::advance(Duration::from_secs(1)).await;
        tracker.fetch_transaction_status(&id, false).await.unwrap();
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_orders_use_default_ttl() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.respond(&url("o-1"), json!({ "status": "Success" }));

        tracker.fetch_transaction_status(&id, false).await.unwrap();
        tracker.fetch_transaction_status(&id, true).await.unwrap();

        tokio::time::advance(DEFAULT_TTL - Duration::from_secs(1)).await;
        tracker.fetch_transaction_status(&id, false).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_final_status_can_be_corrected() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.respond(&url("o-1"), json!({ "status": "Failed" }));
        transport.respond(&url("o-1"), json!({ "status": "Success" }));

        tracker.fetch_transaction_status(&id, false).await.unwrap();
        tracker.fetch_transaction_status(&id, true).await.unwrap();
        assert_eq!(tracker.get_cached_status(&id).unwrap().status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn test_clear_order_cache() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.respond(&url("o-1"), json!({ "status": "Success" }));

        tracker.fetch_transaction_status(&id, false).await.unwrap();
        tracker.clear_order_cache(&id);

        assert!(tracker.get_cached_status(&id).is_none());
        assert!(tracker.cache().is_empty());

        tracker.fetch_transaction_status(&id, false).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_all_cache() {
        let (transport, tracker) = setup();
        transport.respond(&url("a"), json!({ "status": "Success" }));
        transport.respond(&url("b"), json!({ "status": "Pending" }));

        tracker.fetch_transaction_status(&"a".into(), false).await.unwrap();
        tracker.fetch_transaction_status(&"b".into(), false).await.unwrap();
        assert_eq!(tracker.tracked_count(), 2);

        tracker.clear_all_cache();
        assert_eq!(tracker.tracked_count(), 0);
        assert!(tracker.cache().is_empty());
    }

    #[tokio::test]
    async fn test_last_checked_formatting() {
        let (transport, tracker) = setup();
        let id = OrderId::from("o-1");
        transport.respond(&url("o-1"), json!({ "status": "Pending" }));
        assert!(tracker.last_checked(&id, Utc::now()).is_none());

        tracker.fetch_transaction_status(&id, false).await.unwrap();
        let updated = tracker.get_cached_status(&id).unwrap().last_updated;

        let at = |secs| tracker.last_checked(&id, updated + chrono::Duration::seconds(secs));
        assert_eq!(at(12).as_deref(), Some("12s ago"));
        assert_eq!(at(4 * 60 + 5).as_deref(), Some("4m ago"));
        assert_eq!(at(2 * 3600).as_deref(), Some("2h ago"));
    }
}
