//! Scripted transport for tests.
//!
//! Responses are queued per URL. The last queued response for a URL is
//! sticky: it keeps being returned once the queue is down to one entry.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use checkout_core::{ApiTransport, CheckoutError, RequestDescriptor, Result};
use parking_lot::Mutex;
use serde_json::Value;

/// One scripted outcome
#[derive(Clone, Debug)]
pub enum Scripted {
    Body(Value),
    Fail(CheckoutError),
    /// Never settles
    Hang,
}

/// In-memory `ApiTransport` that counts outbound calls
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering (tokio time)
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push(&self, url: &str, outcome: Scripted) -> &Self {
        self.script
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn respond(&self, url: &str, body: Value) -> &Self {
        self.push(url, Scripted::Body(body))
    }

    pub fn fail(&self, url: &str, err: CheckoutError) -> &Self {
        self.push(url, Scripted::Fail(err))
    }

    pub fn hang(&self, url: &str) -> &Self {
        self.push(url, Scripted::Hang)
    }

    /// Total outbound calls
    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    fn next(&self, url: &str) -> Option<Scripted> {
        let mut script = self.script.lock();
        let queue = script.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Value> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().entry(request.url.clone()).or_default() += 1;

        let outcome = self.next(&request.url);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match outcome {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(CheckoutError::HttpStatus { status: 404 }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
