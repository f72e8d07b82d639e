//! Application State

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use checkout_cache::{
    MonitorConfig, OrderStatusTracker, PollHandle, PollerConfig, ResponseCache, StatusMonitor,
    StatusPoller, TrackerConfig,
};
use checkout_core::{ApiTransport, MemoryOrderStore, OrderId, OrderStore};
use checkout_gateway::{GatewayConfig, PaymentClient, WidgetOrigin, WidgetSession};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Order history
    pub orders: Arc<dyn OrderStore>,

    /// Status records over the shared response cache
    pub tracker: Arc<OrderStatusTracker>,

    /// Interval polling for old pending orders
    pub poller: Arc<StatusPoller>,

    /// Delayed first status check for new orders
    pub monitor: Arc<StatusMonitor>,

    pub payments: Arc<PaymentClient>,

    pub widget_origin: WidgetOrigin,

    pub widget_sessions: Arc<RwLock<HashMap<Uuid, WidgetSession>>>,

    /// Running status tasks; dropping a handle stops its task
    watches: Arc<Mutex<HashMap<OrderId, PollHandle>>>,
}

impl AppState {
    pub fn new(transport: Arc<dyn ApiTransport>, config: GatewayConfig) -> Self {
        let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
        let cache = Arc::new(ResponseCache::new(Arc::clone(&transport)));
        let tracker = Arc::new(OrderStatusTracker::new(
            cache,
            TrackerConfig::with_status_url(config.status_url()),
        ));
        let poller = StatusPoller::new(Arc::clone(&tracker), Arc::clone(&orders), PollerConfig::default());
        let monitor = StatusMonitor::new(Arc::clone(&tracker), Arc::clone(&orders), MonitorConfig::default());

        Self {
            orders,
            tracker,
            poller: Arc::new(poller),
            monitor: Arc::new(monitor),
            widget_origin: config.widget_origin.clone(),
            payments: Arc::new(PaymentClient::new(transport, config)),
            widget_sessions: Arc::new(RwLock::new(HashMap::new())),
            watches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Keep a status task alive; replaces any task for the same order
    pub fn track(&self, handle: PollHandle) {
        let mut watches = self.watches.lock();
        watches.retain(|_, h| !h.is_finished());
        watches.insert(handle.order_id().clone(), handle);
    }

    /// Tear down an order's status task
    pub fn untrack(&self, order_id: &OrderId) -> Option<PollHandle> {
        let handle = self.watches.lock().remove(order_id)?;
        handle.cancel();
        Some(handle)
    }

    pub fn is_watching(&self, order_id: &OrderId) -> bool {
        self.watches
            .lock()
            .get(order_id)
            .is_some_and(|h| !h.is_finished())
    }

    pub fn active_watches(&self) -> usize {
        self.watches.lock().values().filter(|h| !h.is_finished()).count()
    }

    /// Cancel every status task
    pub fn shutdown(&self) {
        let handles: Vec<_> = self.watches.lock().drain().map(|(_, h)| h).collect();
        for handle in &handles {
            handle.cancel();
        }
        tracing::info!(count = handles.len(), "Status tasks cancelled");
    }
}
