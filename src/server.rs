use crate::app::suggestion::AccountSuggester;
use crate::handlers::{self, AppState};
use crate::observability::metrics;
use crate::storage::Storage;
use axum::{
    http::Method,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tatabuku",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus exposition endpoint
async fn metrics_endpoint() -> impl IntoResponse {
    metrics::render().unwrap_or_default()
}

/// Build the router with all row-level endpoints.
pub fn create_server(storage: Arc<dyn Storage>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let state = AppState {
        storage,
        suggester: Arc::new(AccountSuggester::new()),
    };

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/companies", get(handlers::companies::list))
        .route(
            "/api/accounts",
            get(handlers::accounts::list).post(handlers::accounts::create),
        )
        .route(
            "/api/accounts/:code",
            get(handlers::accounts::get).put(handlers::accounts::update),
        )
        .route(
            "/api/purchase-orders",
            get(handlers::purchase_orders::list).post(handlers::purchase_orders::create),
        )
        .route(
            "/api/purchase-orders/:id",
            get(handlers::purchase_orders::get)
                .put(handlers::purchase_orders::update)
                .delete(handlers::purchase_orders::delete),
        )
        .route(
            "/api/invoices",
            get(handlers::invoices::list).post(handlers::invoices::create),
        )
        .route(
            "/api/invoices/:id",
            get(handlers::invoices::get)
                .put(handlers::invoices::update)
                .delete(handlers::invoices::delete),
        )
        .route(
            "/api/invoices/:id/payments",
            get(handlers::invoices::list_payments).post(handlers::invoices::record_payment),
        )
        .route(
            "/api/vouchers",
            get(handlers::vouchers::list).post(handlers::vouchers::create),
        )
        .route(
            "/api/vouchers/:id",
            get(handlers::vouchers::get)
                .put(handlers::vouchers::update)
                .delete(handlers::vouchers::delete),
        )
        .route(
            "/api/adjustments",
            get(handlers::adjustments::list).post(handlers::adjustments::create),
        )
        .route(
            "/api/adjustments/:id",
            get(handlers::adjustments::get)
                .put(handlers::adjustments::update)
                .delete(handlers::adjustments::delete),
        )
        .route("/api/suggestions", get(handlers::suggestions::suggest))
        .route("/api/reports/trial-balance", get(handlers::reports::trial_balance))
        .route(
            "/api/reports/profit-loss",
            get(handlers::reports::profit_and_loss),
        )
        .with_state(state)
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    storage: Arc<dyn Storage>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(storage);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📒 API root:     http://localhost:{port}/api");
    println!("📈 Metrics:      http://localhost:{port}/metrics");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
