//! checkout-status HTTP Server
//!
//! Axum server in front of the order book, the status tracker and the
//! payment provider.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::ApiTransport;
use checkout_gateway::{GatewayConfig, HttpTransport};

use crate::handlers::{
    clear_cache, clear_order_cache, create_checkout, create_widget_session, get_order,
    health_check, list_orders, order_status, retry_widget_session, unwatch_order, watch_order,
    widget_message,
};
use crate::state::AppState;

/// All routes, with CORS and request tracing
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))

        // Checkout and order history
        .route("/api/checkout", post(create_checkout))
        .route("/api/orders", get(list_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/status", get(order_status))
        .route("/api/orders/{id}/watch", post(watch_order).delete(unwatch_order))

        // Cache control
        .route("/api/orders/{id}/cache", delete(clear_order_cache))
        .route("/api/cache", delete(clear_cache))

        // Hosted widget
        .route("/api/widget/sessions", post(create_widget_session))
        .route("/api/widget/sessions/{id}/messages", post(widget_message))
        .route("/api/widget/sessions/{id}/retry", post(retry_widget_session))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = GatewayConfig::from_env();
    let transport: Arc<dyn ApiTransport> = Arc::new(HttpTransport::new(config.timeout())?);

    tracing::info!("✓ Payment API: {}", config.api_url);
    tracing::info!("✓ Widget origin: {}", config.widget_origin);
    tracing::info!("  Request timeout: {}s", config.timeout_secs);

    let state = AppState::new(transport, config);
    let app = router(state.clone());

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 checkout-status server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                       - Health check");
    tracing::info!("  POST   /api/checkout                 - Submit a payment");
    tracing::info!("  GET    /api/orders                   - Order history");
    tracing::info!("  GET    /api/orders/{{id}}/status       - Payment status");
    tracing::info!("  POST   /api/orders/{{id}}/watch        - Poll a pending order");
    tracing::info!("  DELETE /api/cache                    - Clear cached statuses");
    tracing::info!("  POST   /api/widget/sessions          - Open a widget checkout");
    tracing::info!("");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown();
    tracing::info!("Server stopped");

    Ok(())
}
