//! HTTP API server for the booking wizard.
//!
//! Provides REST endpoints for wizard sessions and the booking pages,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use booking::{
    BookingApi, BookingCoordinator, InMemoryBookingApi, InMemoryWallet, Listing, Money, Wallet,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wizard::SessionRegistry;

use config::Config;
use routes::metrics::MetricsState;
use routes::wizards::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B, W>(state: Arc<AppState<B, W>>, metrics_handle: PrometheusHandle) -> Router
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(MetricsState {
            handle: metrics_handle,
            registry: state.registry.clone(),
        });

    Router::new()
        .route("/health", get(routes::health::check::<B, W>))
        .route("/config/booking", get(routes::config::booking::<B, W>))
        .route("/wizards", post(routes::wizards::create::<B, W>))
        .route(
            "/wizards/{id}",
            get(routes::wizards::get::<B, W>).delete(routes::wizards::dispose::<B, W>),
        )
        .route(
            "/wizards/{id}/steps/{path}",
            put(routes::wizards::save_step::<B, W>),
        )
        .route(
            "/wizards/{id}/steps/{path}/guard",
            get(routes::wizards::guard::<B, W>),
        )
        .route(
            "/wizards/{id}/current",
            post(routes::wizards::set_current::<B, W>),
        )
        .route("/wizards/{id}/reset", post(routes::wizards::reset::<B, W>))
        .route("/wizards/{id}/draft", get(routes::wizards::draft::<B, W>))
        .route(
            "/wizards/{id}/booking/guests",
            post(routes::booking::guests::<B, W>),
        )
        .route(
            "/wizards/{id}/booking/dates",
            post(routes::booking::dates::<B, W>),
        )
        .route(
            "/wizards/{id}/booking/accommodation",
            post(routes::booking::accommodation::<B, W>),
        )
        .route(
            "/wizards/{id}/booking/questionnaire",
            post(routes::booking::questionnaire::<B, W>),
        )
        .route(
            "/wizards/{id}/booking/checkout",
            post(routes::booking::checkout::<B, W>),
        )
        .route(
            "/wizards/{id}/booking/confirmation",
            get(routes::booking::confirmation::<B, W>),
        )
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

/// Listings served by the in-memory booking API.
pub fn demo_listings() -> Vec<Listing> {
    vec![
        Listing::new("glamping", "Glamping tent", 2, 4, Money::from_cents(6500)).with_token_price(1),
        Listing::new("van", "Camper van", 2, 1, Money::from_cents(5000)).with_token_price(1),
        Listing::new("private-room", "Private room", 2, 6, Money::from_cents(11000))
            .with_token_price(2),
        Listing::new("dorm", "Shared dorm bed", 1, 10, Money::from_cents(3500)),
        Listing::new("cabin", "Family cabin", 5, 2, Money::from_cents(18000)),
    ]
}

/// Creates the default application state with in-memory collaborators.
pub fn create_default_state(config: Config) -> Arc<AppState<InMemoryBookingApi, InMemoryWallet>> {
    let api = InMemoryBookingApi::with_listings(demo_listings());
    let wallet = InMemoryWallet::new("0xdemo", config.booking.chain_id, 1_000);
    let coordinator = BookingCoordinator::new(api, wallet, config.booking.settings());

    Arc::new(AppState {
        registry: SessionRegistry::new(),
        coordinator,
        config,
    })
}
