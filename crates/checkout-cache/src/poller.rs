//! Status Poller
//!
//! Background tasks that keep an order's status fresh while it is on screen.
//!
//! - [`StatusPoller`] re-fetches pending orders that are older than a grace
//!   period, on a fixed interval, until they settle.
//! - [`StatusMonitor`] drives a freshly placed order: one delayed status
//!   check, then it hands over to the poller.
//!
//! Both return a [`PollHandle`] bound to the order view. Dropping the handle
//! tears the task down; the cancellation flag is checked before every fetch
//! and again before a result is written to the order book.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use checkout_core::{Order, OrderId, OrderStore, PaymentStatus};

use crate::tracker::OrderStatusTracker;

/// Poll cadence for pending orders
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Delay before a fresh order's single status check
pub const MONITOR_DELAY: Duration = Duration::from_secs(3);

/// Poller configuration
#[derive(Clone, Debug)]
pub struct PollerConfig {
    pub interval: Duration,

    /// Pending orders younger than this are left to the monitor
    pub grace_period: chrono::Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            grace_period: chrono::Duration::minutes(30),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            delay: MONITOR_DELAY,
        }
    }
}

/// Why a status task stopped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Status left `Pending`
    Settled(PaymentStatus),
    /// Endpoint answered without a status
    NoUpdate,
    /// Handle cancelled or dropped
    Cancelled,
    /// Order no longer in the order book
    OrderGone,
}

/// Owner of a running status task
///
/// Dropping the handle cancels the task.
#[must_use = "dropping the handle stops the task"]
pub struct PollHandle {
    order_id: OrderId,
    cancel: watch::Sender<bool>,
    status: watch::Receiver<Option<PaymentStatus>>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    fn spawn<F, Fut>(order_id: OrderId, initial: Option<PaymentStatus>, run: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>, watch::Sender<Option<PaymentStatus>>) -> Fut,
        Fut: std::future::Future<Output = PollOutcome> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(initial);
        let task = tokio::spawn(run(cancel_rx, status_tx));

        Self {
            order_id,
            cancel: cancel_tx,
            status: status_rx,
            task: Some(task),
        }
    }

    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Stop the task; a fetch already in flight still settles in the cache
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Last status the task observed
    pub fn latest_status(&self) -> Option<PaymentStatus> {
        self.status.borrow().clone()
    }

    /// Wait for the task to stop
    pub async fn join(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

impl std::fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("order_id", &self.order_id)
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

fn cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Write a fetched status to the order book; `false` if the order is gone
fn publish(
    orders: &dyn OrderStore,
    order_id: &OrderId,
    status: &PaymentStatus,
    message: Option<String>,
) -> bool {
    match orders.get(order_id) {
        Ok(Some(order)) if order.status == *status && order.message == message => true,
        Ok(Some(_)) => match orders.update_status(order_id, status.clone(), message) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Failed to apply status");
                true
            }
        },
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(order_id = %order_id, error = %e, "Order lookup failed");
            true
        }
    }
}

/// Outcome when a manual refresh or the monitor already moved the order off `Pending`
fn settled_elsewhere(
    tracker: &OrderStatusTracker,
    orders: &dyn OrderStore,
    order_id: &OrderId,
) -> Option<PollOutcome> {
    match orders.get(order_id) {
        Ok(Some(order)) if !order.status.is_pending() => {
            return Some(PollOutcome::Settled(order.status));
        }
        Ok(None) => return Some(PollOutcome::OrderGone),
        _ => {}
    }

    if tracker.should_poll_status(order_id) {
        None
    } else {
        tracker
            .get_cached_status(order_id)
            .map(|record| PollOutcome::Settled(record.status))
    }
}

/// Interval poller for pending orders
pub struct StatusPoller {
    tracker: Arc<OrderStatusTracker>,
    orders: Arc<dyn OrderStore>,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(
        tracker: Arc<OrderStatusTracker>,
        orders: Arc<dyn OrderStore>,
        config: PollerConfig,
    ) -> Self {
        Self {
            tracker,
            orders,
            config,
        }
    }

    pub const fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Pending and older than the grace period
    pub fn is_eligible(&self, order: &Order, now: DateTime<Utc>) -> bool {
        order.status.is_pending() && order.age(now) > self.config.grace_period
    }

    /// Start polling an order shown in a view, if it needs it
    pub fn watch(&self, order: &Order) -> Option<PollHandle> {
        if !self.is_eligible(order, Utc::now()) {
            tracing::debug!(order_id = %order.order_id, status = %order.status, "Order not eligible for polling");
            return None;
        }

        let tracker = Arc::clone(&self.tracker);
        let orders = Arc::clone(&self.orders);
        let order_id = order.order_id.clone();
        let interval = self.config.interval;

        tracing::info!(order_id = %order_id, interval_secs = interval.as_secs(), "Polling order status");

        Some(PollHandle::spawn(
            order.order_id.clone(),
            Some(order.status.clone()),
            move |cancel, status_tx| poll_loop(tracker, orders, order_id, interval, cancel, status_tx),
        ))
    }
}

async fn poll_loop(
    tracker: Arc<OrderStatusTracker>,
    orders: Arc<dyn OrderStore>,
    order_id: OrderId,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
    status_tx: watch::Sender<Option<PaymentStatus>>,
) -> PollOutcome {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || cancelled(&cancel) {
                    return PollOutcome::Cancelled;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        if cancelled(&cancel) {
            return PollOutcome::Cancelled;
        }

        if let Some(outcome) = settled_elsewhere(&tracker, orders.as_ref(), &order_id) {
            tracing::info!(order_id = %order_id, outcome = ?outcome, "Order settled outside the poller, polling stopped");
            return outcome;
        }

        let result = tracker.fetch_transaction_status(&order_id, true).await;

        if cancelled(&cancel) {
            tracing::debug!(order_id = %order_id, "Poller torn down during fetch, discarding result");
            return PollOutcome::Cancelled;
        }

        match result {
            Ok(response) => {
                let Some(status) = response.status else {
                    continue;
                };
                status_tx.send_replace(Some(status.clone()));

                if !publish(orders.as_ref(), &order_id, &status, response.message) {
                    return PollOutcome::OrderGone;
                }

                if !status.is_pending() || !tracker.should_poll_status(&order_id) {
                    tracing::info!(order_id = %order_id, status = %status, "Order settled, polling stopped");
                    return PollOutcome::Settled(status);
                }
            }
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Status poll failed, retrying next tick");
            }
        }
    }
}

/// Delayed single status check for a freshly placed order
pub struct StatusMonitor {
    tracker: Arc<OrderStatusTracker>,
    orders: Arc<dyn OrderStore>,
    config: MonitorConfig,
}

impl StatusMonitor {
    pub fn new(
        tracker: Arc<OrderStatusTracker>,
        orders: Arc<dyn OrderStore>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            tracker,
            orders,
            config,
        }
    }

    /// Start monitoring; the order reads `Pending` until the check lands
    ///
    /// A transport failure marks the order `Failed`.
    pub fn start(&self, order_id: OrderId) -> PollHandle {
        let tracker = Arc::clone(&self.tracker);
        let orders = Arc::clone(&self.orders);
        let delay = self.config.delay;
        let id = order_id.clone();

        PollHandle::spawn(
            order_id,
            Some(PaymentStatus::Pending),
            move |mut cancel, status_tx| async move {
                tokio::select! {
                    biased;
                    _ = cancel.changed() => return PollOutcome::Cancelled,
                    () = tokio::time::sleep(delay) => {}
                }

                if cancelled(&cancel) {
                    return PollOutcome::Cancelled;
                }

                let result = tracker.fetch_transaction_status(&id, true).await;

                if cancelled(&cancel) {
                    return PollOutcome::Cancelled;
                }

                let (status, message) = match result {
                    Ok(response) => match response.status {
                        Some(status) => (status, response.message),
                        None => return PollOutcome::NoUpdate,
                    },
                    Err(e) => {
                        tracing::warn!(order_id = %id, error = %e, "Status check failed, marking order failed");
                        (PaymentStatus::Failed, Some(e.user_message()))
                    }
                };

                status_tx.send_replace(Some(status.clone()));
                if !publish(orders.as_ref(), &id, &status, message) {
                    return PollOutcome::OrderGone;
                }

                PollOutcome::Settled(status)
            },
        )
    }
}
