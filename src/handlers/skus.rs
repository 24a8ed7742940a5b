use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::{
    geolocation::{
        LocatedSkuFilter, LocationRequest, NewSkuWithLocation, SkuLookup, SkuWithAssignment,
    },
    models::{NewSku, Sku, SkuStatistics, SkuWithLocation, SlotAssignment, SlotDetail},
    response::ApiResponse,
    AppState,
};

use super::{non_empty, parse_date_bound, parse_id, path_id};

#[derive(Deserialize)]
pub struct SkuForm {
    code: String,
    description: Option<String>,
    container_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    term: String,
}

// Query strings arrive as text; blank fields are treated as "no filter".
#[derive(Deserialize)]
pub struct LocatedSkuQuery {
    #[serde(default)]
    warehouse_id: String,
    rack: Option<String>,
    aisle: Option<String>,
    sku_code: Option<String>,
    description: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

impl From<LocatedSkuQuery> for LocatedSkuFilter {
    fn from(query: LocatedSkuQuery) -> Self {
        Self {
            warehouse_id: parse_id(&query.warehouse_id),
            from: parse_date_bound(query.from.as_deref(), false),
            to: parse_date_bound(query.to.as_deref(), true),
            rack: non_empty(query.rack),
            aisle: non_empty(query.aisle),
            sku_code: non_empty(query.sku_code),
            description: non_empty(query.description),
        }
    }
}

pub async fn register_sku(
    State(state): State<AppState>,
    Json(form): Json<SkuForm>,
) -> Json<ApiResponse<Sku>> {
    Json(state.geo.register_sku(NewSku::new(form.code, form.description, form.container_id)).await)
}

pub async fn find_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<ApiResponse<SkuLookup>> {
    Json(state.geo.find_by_sku_code(&code).await)
}

pub async fn create_with_location(
    State(state): State<AppState>,
    Json(request): Json<NewSkuWithLocation>,
) -> Json<ApiResponse<SkuWithAssignment>> {
    Json(state.geo.create_sku_with_location(request).await)
}

pub async fn move_sku(
    State(state): State<AppState>,
    Path(sku_id): Path<String>,
    Json(target): Json<LocationRequest>,
) -> Json<ApiResponse<SlotAssignment>> {
    match path_id(&sku_id, "SKU") {
        Ok(sku_id) => Json(state.geo.move_sku(sku_id, target).await),
        Err(rejected) => rejected,
    }
}

pub async fn clear_location(
    State(state): State<AppState>,
    Path(sku_id): Path<String>,
) -> Json<ApiResponse<bool>> {
    match path_id(&sku_id, "SKU") {
        Ok(sku_id) => Json(state.geo.clear_location(sku_id).await),
        Err(rejected) => rejected,
    }
}

pub async fn located_skus(
    State(state): State<AppState>,
    Query(query): Query<LocatedSkuQuery>,
) -> Json<ApiResponse<Vec<SlotDetail>>> {
    Json(state.geo.list_located_skus(query.into()).await)
}

pub async fn statistics(State(state): State<AppState>) -> Json<ApiResponse<SkuStatistics>> {
    Json(state.geo.sku_statistics().await)
}

pub async fn search_by_description(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<SkuWithLocation>>> {
    Json(state.geo.search_skus_by_description(&query.term).await)
}
