//! Order Book
//!
//! Orders placed during the session, with the status shown to the payer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::card::mask_card_number;
use crate::error::{CheckoutError, Result};
use crate::model::{OrderId, PaymentRequest, PaymentStatus};

/// An order as displayed in the order history
///
/// Card data is kept masked; the full number and CVV never enter the book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub card_holder_name: String,
    pub masked_card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// New order in `Pending`, created now
    pub fn pending(request: &PaymentRequest) -> Self {
        Self {
            order_id: request.order_id.clone(),
            card_holder_name: request.card_holder_name.clone(),
            masked_card_number: mask_card_number(&request.card_number),
            expiry_month: request.expiry_month.clone(),
            expiry_year: request.expiry_year.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            status: PaymentStatus::Pending,
            message: None,
            created_at: Utc::now(),
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// Order history sort key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Amount,
    Name,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter, search and sort for the order history
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    /// Only orders in this status (`None` = all)
    #[serde(default)]
    pub status: Option<PaymentStatus>,

    /// Case-insensitive match on order id or cardholder name
    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub sort: SortKey,

    #[serde(default)]
    pub order: SortDirection,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = &self.status {
            if &order.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                order.order_id.as_str().to_lowercase().contains(&term)
                    || order.card_holder_name.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }

    /// Apply filter and sort to a list of orders
    pub fn apply(&self, orders: impl IntoIterator<Item = Order>) -> Vec<Order> {
        let mut result: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort {
                SortKey::Date => a.created_at.cmp(&b.created_at),
                SortKey::Amount => a.amount.cmp(&b.amount),
                SortKey::Name => a
                    .card_holder_name
                    .to_lowercase()
                    .cmp(&b.card_holder_name.to_lowercase()),
            };
            match self.order {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        result
    }
}

/// Order storage trait
pub trait OrderStore: Send + Sync {
    /// Add a new order (replaces one with the same id)
    fn add(&self, order: Order) -> Result<()>;

    /// Get order by id
    fn get(&self, order_id: &OrderId) -> Result<Option<Order>>;

    /// Set status and message; returns the updated order
    fn update_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        message: Option<String>,
    ) -> Result<Order>;

    /// List orders matching a query
    fn list(&self, query: &OrderQuery) -> Result<Vec<Order>>;
}

/// In-memory order store, lives for the process
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

impl OrderStore for MemoryOrderStore {
    fn add(&self, order: Order) -> Result<()> {
        tracing::debug!(order_id = %order.order_id, "Adding order");
        self.orders.write().insert(order.order_id.clone(), order);
        Ok(())
    }

    fn get(&self, order_id: &OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().get(order_id).cloned())
    }

    fn update_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        message: Option<String>,
    ) -> Result<Order> {
        let mut orders = self.orders.write();
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;

        if order.status != status {
            tracing::info!(
                order_id = %order_id,
                from = %order.status,
                to = %status,
                "Order status changed"
            );
        }
        order.status = status;
        order.message = message;

        Ok(order.clone())
    }

    fn list(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let orders = self.orders.read();
        Ok(query.apply(orders.values().cloned()))
    }
}
