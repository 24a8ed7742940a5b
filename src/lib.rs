//! Warehouse SKU geolocation: which SKU sits in which rack, level and aisle.

pub mod config;
pub mod database;
pub mod error;
pub mod geolocation;
pub mod handlers;
pub mod models;
pub mod response;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{GeoError, GeoResult};
pub use geolocation::GeolocationService;
pub use response::ApiResponse;

use store::InventoryStore;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub geo: GeolocationService,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            geo: GeolocationService::new(store),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Warehouses
        .route("/api/warehouses", get(handlers::warehouses::list_warehouses))
        .route("/api/warehouses", post(handlers::warehouses::create_warehouse))
        .route("/api/warehouses/summary", get(handlers::warehouses::warehouse_summary))
        .route("/api/warehouses/:id/occupancy", get(handlers::warehouses::occupancy_map))
        .route("/api/warehouses/:id/statistics", get(handlers::warehouses::statistics))
        .route("/api/warehouses/:id/available", get(handlers::warehouses::available_locations))
        .route("/api/warehouses/:id/skus", get(handlers::warehouses::warehouse_skus))

        // SKUs
        .route("/api/skus", post(handlers::skus::register_sku))
        .route("/api/skus/located", get(handlers::skus::located_skus))
        .route("/api/skus/statistics", get(handlers::skus::statistics))
        .route("/api/skus/search", get(handlers::skus::search_by_description))
        .route("/api/skus/by-code/:code", get(handlers::skus::find_by_code))
        .route("/api/skus/with-location", post(handlers::skus::create_with_location))
        .route(
            "/api/skus/:id/location",
            put(handlers::skus::move_sku).delete(handlers::skus::clear_location),
        )

        // Locations
        .route("/api/locations", get(handlers::locations::list_locations))
        .route("/api/locations/search", get(handlers::locations::search))
        .route("/api/locations/rack/:rack", get(handlers::locations::by_rack))
        .route("/api/locations/aisle/:aisle", get(handlers::locations::by_aisle))
        .route("/api/locations/check", post(handlers::locations::check))
        .route("/api/locations/validate", post(handlers::locations::validate))

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(1024 * 1024)), // 1MB
        )
        .with_state(state)
}
