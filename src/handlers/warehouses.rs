use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;

use crate::{
    geolocation::service::{WarehouseLocations, WarehouseOccupancy, WarehouseOverview},
    geolocation::WarehouseSummary,
    models::{NewWarehouse, SlotDetail, Warehouse},
    response::ApiResponse,
    AppState,
};

use super::path_id;

#[derive(Deserialize)]
pub struct WarehouseForm {
    name: String,
    capacity: Option<i32>,
}

pub async fn list_warehouses(State(state): State<AppState>) -> Json<ApiResponse<Vec<Warehouse>>> {
    Json(state.geo.list_warehouses().await)
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(form): Json<WarehouseForm>,
) -> Json<ApiResponse<Warehouse>> {
    Json(state.geo.create_warehouse(NewWarehouse::new(form.name, form.capacity)).await)
}

pub async fn warehouse_summary(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<WarehouseSummary>>> {
    Json(state.geo.warehouse_summary_all().await)
}

pub async fn occupancy_map(
    State(state): State<AppState>,
    Path(warehouse_id): Path<String>,
) -> Json<ApiResponse<WarehouseOccupancy>> {
    match path_id(&warehouse_id, "warehouse") {
        Ok(warehouse_id) => Json(state.geo.occupancy_map(warehouse_id).await),
        Err(rejected) => rejected,
    }
}

pub async fn statistics(
    State(state): State<AppState>,
    Path(warehouse_id): Path<String>,
) -> Json<ApiResponse<WarehouseOverview>> {
    match path_id(&warehouse_id, "warehouse") {
        Ok(warehouse_id) => Json(state.geo.warehouse_statistics(warehouse_id).await),
        Err(rejected) => rejected,
    }
}

pub async fn available_locations(
    State(state): State<AppState>,
    Path(warehouse_id): Path<String>,
) -> Json<ApiResponse<WarehouseLocations>> {
    match path_id(&warehouse_id, "warehouse") {
        Ok(warehouse_id) => Json(state.geo.available_locations(warehouse_id).await),
        Err(rejected) => rejected,
    }
}

pub async fn warehouse_skus(
    State(state): State<AppState>,
    Path(warehouse_id): Path<String>,
) -> Json<ApiResponse<Vec<SlotDetail>>> {
    match path_id(&warehouse_id, "warehouse") {
        Ok(warehouse_id) => Json(state.geo.list_skus_by_warehouse(warehouse_id).await),
        Err(rejected) => rejected,
    }
}
