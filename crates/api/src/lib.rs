//! HTTP API for the restaurant order engine.
//!
//! Provides REST endpoints for placement, lifecycle transitions, payment
//! collection, the kitchen queue, customer tracking, the menu and
//! administrative overrides, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use engine::{
    Catalog, CatalogCache, CodeGenerator, InMemoryBillingProvider, OrderEngine, StaticCatalog,
};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use projections::{
    KitchenQueueView, PaymentDueView, Projection, ProjectionProcessor, TrackingProjector,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + ?Sized + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/track/{code}", get(routes::orders::track::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", patch(routes::orders::transition::<S>))
        .route("/orders/{id}/payment", get(routes::orders::payment::<S>))
        .route("/orders/{id}/charge", post(routes::orders::charge::<S>))
        .route("/queue", get(routes::queue::kitchen::<S>))
        .route("/queue/payment-due", get(routes::queue::payment_due::<S>))
        .route(
            "/admin/orders/{id}",
            put(routes::admin::replace::<S>).delete(routes::admin::delete::<S>),
        )
        .route("/admin/orders/{id}/audit", get(routes::admin::audit::<S>))
        .route("/webhooks/billing", post(routes::webhooks::billing::<S>))
        .route("/menu", get(routes::menu::get::<S>))
        .route("/menu/invalidate", post(routes::menu::invalidate::<S>))
        .route("/cart/quote", post(routes::menu::quote::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`, with the in-memory billing
/// provider and `catalog` as the menu source.
///
/// The returned processor is not running yet; spawn it to keep the queue
/// views in step with store changes.
pub fn create_default_state<S: OrderStore + ?Sized + 'static>(
    store: Arc<S>,
    config: &Config,
    catalog: Catalog,
) -> (Arc<AppState<S>>, Arc<ProjectionProcessor<S>>) {
    let engine = OrderEngine::new(Arc::clone(&store), InMemoryBillingProvider::new())
        .with_codes(CodeGenerator::new(config.code_prefix), config.code_attempts);

    let kitchen_queue = KitchenQueueView::new();
    let payment_due = PaymentDueView::new();

    let mut processor =
        ProjectionProcessor::new(store).with_resync_interval(config.queue_resync());
    processor.register(Box::new(kitchen_queue.clone()) as Box<dyn Projection>);
    processor.register(Box::new(payment_due.clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let state = Arc::new(AppState {
        engine,
        kitchen_queue,
        payment_due,
        tracking: TrackingProjector::new(config.tracking_poll()),
        catalog: CatalogCache::new(StaticCatalog::new(catalog), config.catalog_ttl()),
        projection_processor: Arc::clone(&processor),
    });

    (state, processor)
}
