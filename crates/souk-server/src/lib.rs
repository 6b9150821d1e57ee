// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! HTTP layer of souk: application state, router, and the bulkhead that
//! funnels handler work onto the blocking pool where SQLite lives.

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;
use souk_api::ApiError;
use souk_store::{Store, StoreError};
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::error;

pub mod auth;
pub mod config;
pub mod mailer;
pub mod metrics;

mod checkout;
mod http;
mod middleware;

pub use config::{validate_startup_config_contract, ServerConfig};
pub use mailer::{mailer_from_config, HttpMailer, LogMailer, Mailer, OrderEmail};

pub const CRATE_NAME: &str = "souk-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<ServerConfig>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) metrics: Arc<metrics::ApiMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
    pub(crate) store_gate: Arc<Semaphore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, config: ServerConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            store_gate: Arc::new(Semaphore::new(config.concurrency_limit)),
            config: Arc::new(config),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            mailer,
            metrics: Arc::new(metrics::ApiMetrics::new()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

/// Logs store internals before they collapse into an opaque 500; conflict
/// and cursor errors pass through with their messages intact.
pub(crate) fn store_fail(err: StoreError) -> ApiError {
    if matches!(err, StoreError::Other(_)) {
        error!("store error: {err}");
    }
    ApiError::from(err)
}

/// Runs one store operation on the blocking pool, behind the concurrency
/// gate. Every handler that touches SQLite goes through here.
pub(crate) async fn run_store<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T, ApiError> + Send + 'static,
{
    let permit = state
        .store_gate
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::internal())?;
    let store = state.store.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let mut conn = store.conn().map_err(store_fail)?;
        op(&mut conn)
    })
    .await;
    match joined {
        Ok(result) => result,
        Err(e) => {
            error!("store task failed: {e}");
            Err(ApiError::internal())
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;
    Router::new()
        .route("/healthz", get(http::ops::healthz_handler))
        .route("/readyz", get(http::ops::readyz_handler))
        .route("/metrics", get(http::ops::metrics_handler))
        .route("/feed/products.xml", get(http::storefront::feed_handler))
        .route("/api/auth/register", post(http::auth_routes::register_handler))
        .route("/api/auth/login", post(http::auth_routes::login_handler))
        .route("/api/auth/logout", post(http::auth_routes::logout_handler))
        .route("/api/auth/me", get(http::auth_routes::me_handler))
        .route("/api/category", get(http::storefront::categories_handler))
        .route("/api/product", get(http::storefront::products_handler))
        .route(
            "/api/product/:slug",
            get(http::storefront::product_detail_handler),
        )
        .route(
            "/api/orders/create",
            post(http::storefront::create_order_handler),
        )
        .route("/api/vendor/apply", post(http::vendor_panel::apply_handler))
        .route(
            "/api/vendor/me",
            get(http::vendor_panel::me_handler).patch(http::vendor_panel::update_profile_handler),
        )
        .route(
            "/api/vendor/product",
            get(http::vendor_panel::list_products_handler)
                .post(http::vendor_panel::create_product_handler),
        )
        .route(
            "/api/vendor/product/:id",
            patch(http::vendor_panel::update_product_handler)
                .delete(http::vendor_panel::delete_product_handler),
        )
        .route(
            "/api/vendor/orders",
            get(http::vendor_panel::list_orders_handler),
        )
        .route(
            "/api/vendor/orders/:id/status",
            patch(http::vendor_panel::update_order_status_handler),
        )
        .route(
            "/api/admin/category",
            get(http::admin::list_categories_handler).post(http::admin::create_category_handler),
        )
        .route(
            "/api/admin/category/:id",
            patch(http::admin::update_category_handler).delete(http::admin::delete_category_handler),
        )
        .route(
            "/api/admin/product",
            get(http::admin::list_products_handler).post(http::admin::create_product_handler),
        )
        .route(
            "/api/admin/product/:id",
            patch(http::admin::update_product_handler).delete(http::admin::delete_product_handler),
        )
        .route(
            "/api/admin/product/:id/variant",
            post(http::admin::create_variant_handler),
        )
        .route(
            "/api/admin/variant/:id",
            patch(http::admin::update_variant_handler).delete(http::admin::delete_variant_handler),
        )
        .route("/api/admin/vendor", get(http::admin::list_vendors_handler))
        .route(
            "/api/admin/vendor/:id",
            get(http::admin::vendor_detail_handler),
        )
        .route(
            "/api/admin/vendor/:id/status",
            patch(http::admin::update_vendor_status_handler),
        )
        .route("/api/admin/orders", get(http::admin::list_orders_handler))
        .route(
            "/api/admin/orders/:id",
            get(http::admin::order_detail_handler),
        )
        .route(
            "/api/admin/orders/:id/payment",
            patch(http::admin::update_payment_handler),
        )
        .route(
            "/api/admin/orders/:id/status",
            patch(http::admin::update_order_status_handler),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
