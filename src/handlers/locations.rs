use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::{
    geolocation::service::LocationValidation,
    geolocation::{LocationCheck, LocationFilter, LocationRequest},
    models::SlotDetail,
    response::ApiResponse,
    AppState,
};

use super::{non_empty, parse_date_bound, parse_id, WarehouseScope};

#[derive(Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    warehouse_id: String,
    rack: Option<String>,
    level: Option<String>,
    aisle: Option<String>,
    sku_code: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

impl From<LocationQuery> for LocationFilter {
    fn from(query: LocationQuery) -> Self {
        Self {
            warehouse_id: parse_id(&query.warehouse_id),
            from: parse_date_bound(query.from.as_deref(), false),
            to: parse_date_bound(query.to.as_deref(), true),
            rack: non_empty(query.rack),
            level: non_empty(query.level),
            aisle: non_empty(query.aisle),
            sku_code: non_empty(query.sku_code),
        }
    }
}

#[derive(Deserialize)]
pub struct FragmentQuery {
    #[serde(default)]
    term: String,
    #[serde(default)]
    warehouse_id: String,
}

#[derive(Deserialize)]
pub struct LocationFormat {
    rack: String,
    level: String,
    aisle: String,
}

pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Json<ApiResponse<Vec<SlotDetail>>> {
    Json(state.geo.list_locations(query.into()).await)
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<FragmentQuery>,
) -> Json<ApiResponse<Vec<SlotDetail>>> {
    Json(
        state
            .geo
            .search_by_coordinate_fragment(&query.term, parse_id(&query.warehouse_id))
            .await,
    )
}

pub async fn by_rack(
    State(state): State<AppState>,
    Path(rack): Path<String>,
    Query(scope): Query<WarehouseScope>,
) -> Json<ApiResponse<Vec<SlotDetail>>> {
    Json(state.geo.list_by_rack(&rack, scope.warehouse_id()).await)
}

pub async fn by_aisle(
    State(state): State<AppState>,
    Path(aisle): Path<String>,
    Query(scope): Query<WarehouseScope>,
) -> Json<ApiResponse<Vec<SlotDetail>>> {
    Json(state.geo.list_by_aisle(&aisle, scope.warehouse_id()).await)
}

pub async fn check(
    State(state): State<AppState>,
    Json(request): Json<LocationRequest>,
) -> Json<ApiResponse<LocationCheck>> {
    Json(state.geo.check_location(request).await)
}

pub async fn validate(
    State(state): State<AppState>,
    Json(format): Json<LocationFormat>,
) -> Json<ApiResponse<LocationValidation>> {
    Json(state.geo.validate_location_format(&format.rack, &format.level, &format.aisle))
}
