//! HTTP Handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use checkout_core::{
    CheckoutError, Order, OrderId, OrderQuery, OrderStatusRecord, PaymentStatus, SortDirection,
    SortKey,
    card::{self, PaymentForm},
};
use checkout_gateway::{WidgetFields, WidgetFormMessage, WidgetSession};

use crate::state::AppState;

const PAYMENT_FAILED_MESSAGE: &str = "Payment processing failed. Please try again.";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub payment_api: String,
    pub orders_tracked: usize,
    pub cached_responses: usize,
    pub in_flight_requests: usize,
    pub active_watches: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<&'static str, String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub redirect_url: Option<String>,
}

/// Order history query; `status=all` means no filter
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortDirection,
}

impl From<OrdersQuery> for OrderQuery {
    fn from(query: OrdersQuery) -> Self {
        let status = query
            .status
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
            .map(|s| PaymentStatus::parse(&s));

        Self {
            status,
            search: query.search,
            sort: query.sort,
            order: query.order,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub status_record: Option<OrderStatusRecord>,
    pub last_checked: Option<String>,
    pub should_poll: bool,
    pub watching: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub order_id: OrderId,
    pub status: Option<PaymentStatus>,
    pub message: Option<String>,
    pub last_checked: Option<String>,
    pub should_poll: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    pub order_id: OrderId,
    pub watching: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSessionResponse {
    pub session: WidgetSession,
    pub form_message: WidgetFormMessage,
    pub target_origin: String,
}

/// A message the browser relayed from the widget, with the origin it came from
#[derive(Debug, Deserialize)]
pub struct InboundWidgetMessage {
    pub origin: String,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct WidgetMessageResponse {
    pub handled: bool,
    pub session: WidgetSession,
}

// ============================================================================
// Errors
// ============================================================================

fn api_error(err: &CheckoutError) -> ApiError {
    let status = match err {
        CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        CheckoutError::Widget(_) => StatusCode::BAD_REQUEST,
        CheckoutError::Transport(_) | CheckoutError::HttpStatus { .. } | CheckoutError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
        CheckoutError::Config(_) | CheckoutError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: err.code().into(),
            fields: BTreeMap::new(),
        }),
    )
}

fn find_order(state: &AppState, order_id: &OrderId) -> Result<Order, ApiError> {
    state
        .orders
        .get(order_id)
        .map_err(|e| api_error(&e))?
        .ok_or_else(|| api_error(&CheckoutError::OrderNotFound(order_id.to_string())))
}

fn session_not_found(session_id: Uuid) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Widget session {session_id} was not found."),
            code: "session_not_found".into(),
            fields: BTreeMap::new(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.tracker.cache();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        payment_api: state.payments.config().api_url.clone(),
        orders_tracked: state.tracker.tracked_count(),
        cached_responses: cache.len(),
        in_flight_requests: cache.in_flight_count(),
        active_watches: state.active_watches(),
    })
}

/// Server-to-server checkout
///
/// The order is recorded as `Pending` before the provider is called, then a
/// delayed status check is started for it.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(form): Json<PaymentForm>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let today = card::today();

    let fields = form.validate(today);
    if !fields.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "Invalid payment details".into(),
                code: "validation".into(),
                fields,
            }),
        ));
    }

    let request = form
        .into_request(OrderId::new(), today)
        .map_err(|e| api_error(&e))?;
    state
        .orders
        .add(Order::pending(&request))
        .map_err(|e| api_error(&e))?;

    let initiation = match state.payments.initiate_payment(&request).await {
        Ok(initiation) => initiation,
        Err(e) => {
            if let Err(update) = state.orders.update_status(
                &request.order_id,
                PaymentStatus::Failed,
                Some(PAYMENT_FAILED_MESSAGE.into()),
            ) {
                tracing::warn!(order_id = %request.order_id, error = %update, "Could not mark order failed");
            }
            return Err(api_error(&e));
        }
    };

    state.track(state.monitor.start(request.order_id.clone()));

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: request.order_id,
            status: PaymentStatus::Pending,
            redirect_url: initiation.redirect_url,
        }),
    ))
}

/// Order history
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .orders
        .list(&query.into())
        .map_err(|e| api_error(&e))?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderDetail>, ApiError> {
    let order_id = OrderId::from_string(order_id);
    let order = find_order(&state, &order_id)?;

    Ok(Json(OrderDetail {
        order,
        status_record: state.tracker.get_cached_status(&order_id),
        last_checked: state.tracker.last_checked(&order_id, Utc::now()),
        should_poll: state.tracker.should_poll_status(&order_id),
        watching: state.is_watching(&order_id),
    }))
}

/// Fetch an order's status through the tracker and apply it to the order book
pub async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusView>, ApiError> {
    let order_id = OrderId::from_string(order_id);

    let response = state
        .tracker
        .fetch_transaction_status(&order_id, query.refresh)
        .await
        .map_err(|e| {
            tracing::warn!(order_id = %order_id, error = %e, "Status check failed");
            api_error(&e)
        })?;

    if let Some(status) = &response.status {
        match state
            .orders
            .update_status(&order_id, status.clone(), response.message.clone())
        {
            Ok(_) | Err(CheckoutError::OrderNotFound(_)) => {}
            Err(e) => tracing::warn!(order_id = %order_id, error = %e, "Could not apply status"),
        }
    }

    Ok(Json(StatusView {
        last_checked: state.tracker.last_checked(&order_id, Utc::now()),
        should_poll: state.tracker.should_poll_status(&order_id),
        order_id,
        status: response.status,
        message: response.message,
    }))
}

/// Start polling an order that is on screen
pub async fn watch_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<(StatusCode, Json<WatchResponse>), ApiError> {
    let order_id = OrderId::from_string(order_id);
    let order = find_order(&state, &order_id)?;

    if state.is_watching(&order_id) {
        return Ok((
            StatusCode::OK,
            Json(WatchResponse {
                order_id,
                watching: true,
                reason: Some("already watching"),
            }),
        ));
    }

    match state.poller.watch(&order) {
        Some(handle) => {
            state.track(handle);
            Ok((
                StatusCode::ACCEPTED,
                Json(WatchResponse {
                    order_id,
                    watching: true,
                    reason: None,
                }),
            ))
        }
        None => Ok((
            StatusCode::OK,
            Json(WatchResponse {
                order_id,
                watching: false,
                reason: Some("order is not eligible for polling"),
            }),
        )),
    }
}

/// Tear down an order's poller
pub async fn unwatch_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> StatusCode {
    match state.untrack(&OrderId::from_string(order_id)) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

pub async fn clear_order_cache(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> StatusCode {
    state.tracker.clear_order_cache(&OrderId::from_string(order_id));
    StatusCode::NO_CONTENT
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.tracker.clear_all_cache();
    StatusCode::NO_CONTENT
}

/// Open a hosted-widget checkout
pub async fn create_widget_session(
    State(state): State<AppState>,
    Json(fields): Json<WidgetFields>,
) -> (StatusCode, Json<WidgetSessionResponse>) {
    let session = WidgetSession::new(state.widget_origin.clone());
    let (form_message, target) = session.form_message(fields);
    let target_origin = target.to_string();

    tracing::info!(session_id = %session.session_id, order_id = %session.order_id, "Widget session opened");
    state
        .widget_sessions
        .write()
        .insert(session.session_id, session.clone());

    (
        StatusCode::CREATED,
        Json(WidgetSessionResponse {
            session,
            form_message,
            target_origin,
        }),
    )
}

/// Relay a message from the widget
pub async fn widget_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(message): Json<InboundWidgetMessage>,
) -> Result<Json<WidgetMessageResponse>, ApiError> {
    let mut sessions = state.widget_sessions.write();
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    let handled = session.handle(&message.origin, &message.data);

    Ok(Json(WidgetMessageResponse {
        handled,
        session: session.clone(),
    }))
}

/// Restart a widget checkout under a new order id
pub async fn retry_widget_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WidgetSessionResponse>, ApiError> {
    let mut sessions = state.widget_sessions.write();
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    let order_id = session.retry().clone();
    tracing::info!(session_id = %session_id, order_id = %order_id, "Widget session retried");

    let (form_message, target) = session.form_message(WidgetFields::default());
    Ok(Json(WidgetSessionResponse {
        target_origin: target.to_string(),
        form_message,
        session: session.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use checkout_cache::testkit::MockTransport;
    use checkout_gateway::GatewayConfig;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    const API: &str = "https://api.test";

    fn setup() -> (Arc<MockTransport>, AppState, Router) {
        let transport = Arc::new(MockTransport::new());
        let state = AppState::new(transport.clone(), GatewayConfig::new(API));
        let app = crate::router(state.clone());
        (transport, state, app)
    }

    fn status_url(order_id: &str) -> String {
        format!("{API}/redirect?orderId={order_id}")
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn form() -> Value {
        json!({
            "cardHolderName": "Ada Lovelace",
            "cardNumber": "4111 1111 1111 1111",
            "expiryMonth": "09",
            "expiryYear": "39",
            "cardCVC": "123",
            "amount": "42.50",
            "currency": "USD"
        })
    }

    fn old_pending_order(order_id: &str) -> Order {
        Order {
            order_id: order_id.into(),
            card_holder_name: "Grace Hopper".into(),
            masked_card_number: "**** **** **** 1111".into(),
            expiry_month: "09".into(),
            expiry_year: "39".into(),
            amount: "10".parse().unwrap(),
            currency: "USD".into(),
            status: PaymentStatus::Pending,
            message: None,
            created_at: Utc::now() - chrono::Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let (_, _, app) = setup();
        let (status, body) = send(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["paymentApi"], API);
    }

    #[tokio::test]
    async fn test_checkout_creates_pending_order() {
        let (transport, state, app) = setup();
        transport.respond(&format!("{API}/pay"), json!({ "redirect_url": "https://pay.example/r/1" }));

        let (status, body) = send(&app, Method::POST, "/api/checkout", Some(form())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "Pending");
        assert_eq!(body["redirectUrl"], "https://pay.example/r/1");

        let order_id = OrderId::from(body["orderId"].as_str().unwrap());
        let order = state.orders.get(&order_id).unwrap().unwrap();
        assert_eq!(order.masked_card_number, "**** **** **** 1111");
        assert!(state.is_watching(&order_id));
    }

    #[tokio::test]
    async fn test_checkout_rejects_invalid_form() {
        let (transport, _, app) = setup();
        let mut form = form();
        form["cardNumber"] = json!("4111 1111 1111 1112");
        form["amount"] = json!("-3");

        let (status, body) = send(&app, Method::POST, "/api/checkout", Some(form)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "validation");
        assert!(body["fields"]["cardNumber"].is_string());
        assert!(body["fields"]["amount"].is_string());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_checkout_provider_failure_marks_order_failed() {
        let (transport, state, app) = setup();
        transport.fail(&format!("{API}/pay"), CheckoutError::HttpStatus { status: 500 });

        let (status, body) = send(&app, Method::POST, "/api/checkout", Some(form())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "http_status");

        let orders = state.orders.list(&OrderQuery::default()).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, PaymentStatus::Failed);
        assert_eq!(orders[0].message.as_deref(), Some(PAYMENT_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_status_applies_to_order_book() {
        let (transport, state, app) = setup();
        state.orders.add(old_pending_order("abc123")).unwrap();
        transport.respond(&status_url("abc123"), json!({ "status": "Success", "message": "Payment processed" }));

        let (status, body) = send(&app, Method::GET, "/api/orders/abc123/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Success");
        assert_eq!(body["shouldPoll"], false);
        let order = state.orders.get(&"abc123".into()).unwrap().unwrap();
        assert_eq!(order.status, PaymentStatus::Success);

        // Second call is served from the cache
        send(&app, Method::GET, "/api/orders/abc123/status", None).await;
        assert_eq!(transport.calls(), 1);

        // Refresh bypasses it
        send(&app, Method::GET, "/api/orders/abc123/status?refresh=true", None).await;
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_status_transport_failure() {
        let (transport, _, app) = setup();
        transport.fail(&status_url("o-1"), CheckoutError::Transport("connection reset".into()));

        let (status, body) = send(&app, Method::GET, "/api/orders/o-1/status", None).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "transport");
    }

    #[tokio::test]
    async fn test_list_orders_with_filters() {
        let (_, state, app) = setup();
        state.orders.add(old_pending_order("p-1")).unwrap();
        let mut done = old_pending_order("s-1");
        done.status = PaymentStatus::Success;
        done.card_holder_name = "Alan Turing".into();
        state.orders.add(done).unwrap();

        let (_, all) = send(&app, Method::GET, "/api/orders?status=all", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, success) = send(&app, Method::GET, "/api/orders?status=Success", None).await;
        assert_eq!(success.as_array().unwrap().len(), 1);
        assert_eq!(success[0]["orderId"], "s-1");

        let (_, search) = send(&app, Method::GET, "/api/orders?search=grace", None).await;
        assert_eq!(search.as_array().unwrap().len(), 1);
        assert_eq!(search[0]["orderId"], "p-1");
    }

    #[tokio::test]
    async fn test_get_order_detail() {
        let (transport, state, app) = setup();
        state.orders.add(old_pending_order("abc123")).unwrap();
        transport.respond(&status_url("abc123"), json!({ "status": "Pending" }));

        let (status, body) = send(&app, Method::GET, "/api/orders/abc123", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orderId"], "abc123");
        assert!(body["statusRecord"].is_null());
        assert_eq!(body["shouldPoll"], true);

        send(&app, Method::GET, "/api/orders/abc123/status", None).await;
        let (_, body) = send(&app, Method::GET, "/api/orders/abc123", None).await;
        assert_eq!(body["statusRecord"]["status"], "Pending");
        assert!(body["lastChecked"].as_str().unwrap().ends_with("ago"));

        let (status, _) = send(&app, Method::GET, "/api/orders/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_watch_and_unwatch() {
        let (transport, state, app) = setup();
        state.orders.add(old_pending_order("abc123")).unwrap();
        transport.respond(&status_url("abc123"), json!({ "status": "Pending" }));

        let (status, body) = send(&app, Method::POST, "/api/orders/abc123/watch", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["watching"], true);
        assert_eq!(state.active_watches(), 1);

        let (status, body) = send(&app, Method::POST, "/api/orders/abc123/watch", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reason"], "already watching");

        let (status, _) = send(&app, Method::DELETE, "/api/orders/abc123/watch", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!state.is_watching(&"abc123".into()));

        let (status, _) = send(&app, Method::DELETE, "/api/orders/abc123/watch", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_watch_skips_recent_orders() {
        let (_, state, app) = setup();
        let mut order = old_pending_order("fresh");
        order.created_at = Utc::now();
        state.orders.add(order).unwrap();

        let (status, body) = send(&app, Method::POST, "/api/orders/fresh/watch", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["watching"], false);
    }

    #[tokio::test]
    async fn test_clear_caches() {
        let (transport, state, app) = setup();
        transport.respond(&status_url("abc123"), json!({ "status": "Success" }));

        send(&app, Method::GET, "/api/orders/abc123/status", None).await;
        assert_eq!(state.tracker.tracked_count(), 1);

        let (status, _) = send(&app, Method::DELETE, "/api/orders/abc123/cache", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.tracker.tracked_count(), 0);

        send(&app, Method::GET, "/api/orders/abc123/status", None).await;
        assert_eq!(transport.calls(), 2);

        let (status, _) = send(&app, Method::DELETE, "/api/cache", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.tracker.cache().is_empty());
    }

    #[tokio::test]
    async fn test_widget_flow() {
        let (_, _, app) = setup();

        let (status, body) = send(&app, Method::POST, "/api/widget/sessions", Some(json!({ "amount": "15" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["targetOrigin"], "https://celalios.com");
        assert_eq!(body["formMessage"]["showForm"], 1);
        assert_eq!(body["formMessage"]["amount"], "15");
        let session_id = body["session"]["sessionId"].as_str().unwrap().to_string();
        let first_order = body["session"]["orderId"].as_str().unwrap().to_string();
        assert!(first_order.starts_with("order_"));

        let uri = format!("/api/widget/sessions/{session_id}/messages");
        let (_, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "origin": "https://evil.example", "data": { "type": "paymentStatus", "status": "success" } })),
        )
        .await;
        assert_eq!(body["handled"], false);

        let (_, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "origin": "https://celalios.com", "data": { "type": "paymentStatus", "status": "failed" } })),
        )
        .await;
        assert_eq!(body["handled"], true);
        assert_eq!(body["session"]["error"], "Payment failed. Please try again.");

        let (status, body) = send(&app, Method::POST, &format!("/api/widget/sessions/{session_id}/retry"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(body["session"]["orderId"], first_order.as_str());
        assert!(body["session"]["error"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_widget_session() {
        let (_, _, app) = setup();
        let uri = format!("/api/widget/sessions/{}/retry", Uuid::new_v4());

        let (status, body) = send(&app, Method::POST, &uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "session_not_found");
    }
}
