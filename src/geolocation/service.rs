//! Entry point for everything outside the geolocation core.
//!
//! Each public method wraps an internal `GeoResult` computation and hands back
//! an [`ApiResponse`]; nothing here returns `Err`.

use std::{cmp::Ordering, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{GeoError, GeoResult},
    models::{
        NewSku, NewWarehouse, Sku, SkuStatistics, SkuWithLocation, SlotAssignment, SlotDetail,
        Warehouse,
    },
    response::ApiResponse,
    store::{contains_ignore_case, InventoryStore, SlotQuery},
};

use super::{
    codec::{self, Location},
    registry::SlotRegistry,
    reporting::{
        OccupancyEntry, OccupancyReport, OccupiedLocation, WarehouseStatistics, WarehouseSummary,
    },
};

/// Target coordinates for a move or an availability check.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRequest {
    pub warehouse_id: i32,
    pub rack: String,
    pub level: String,
    pub aisle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSkuWithLocation {
    pub code: String,
    pub description: Option<String>,
    pub container_id: Option<i32>,
    pub warehouse_id: i32,
    pub rack: String,
    pub level: String,
    pub aisle: String,
}

/// Filters for the full location listing. Text filters are case-insensitive
/// substrings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationFilter {
    pub warehouse_id: Option<i32>,
    pub rack: Option<String>,
    pub level: Option<String>,
    pub aisle: Option<String>,
    pub sku_code: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocatedSkuFilter {
    pub warehouse_id: Option<i32>,
    pub rack: Option<String>,
    pub aisle: Option<String>,
    pub sku_code: Option<String>,
    pub description: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SkuLookup {
    Located { sku: Sku, location: SlotDetail },
    Unlocated { sku: Sku },
}

impl SkuLookup {
    pub fn is_located(&self) -> bool {
        matches!(self, Self::Located { .. })
    }

    pub fn sku(&self) -> &Sku {
        match self {
            Self::Located { sku, .. } | Self::Unlocated { sku } => sku,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkuWithAssignment {
    pub sku: Sku,
    pub assignment: SlotAssignment,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseOccupancy {
    pub warehouse: Warehouse,
    pub map: Vec<OccupancyEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseOverview {
    pub summary: WarehouseSummary,
    pub statistics: WarehouseStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseLocations {
    pub warehouse: Warehouse,
    pub occupied: Vec<OccupiedLocation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationCheck {
    pub available: bool,
    pub location_code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationValidation {
    pub valid: bool,
    pub location_code: String,
    pub message: String,
}

/// Listings: warehouse name, then location code, both ascending.
pub fn sort_by_warehouse_and_code(details: &mut [SlotDetail]) {
    details.sort_by(|a, b| {
        a.warehouse_name
            .cmp(&b.warehouse_name)
            .then_with(|| a.location_code.cmp(&b.location_code))
    });
}

/// Most recently located first; rows without a timestamp go last.
pub fn sort_by_recency(details: &mut [SlotDetail]) {
    details.sort_by(|a, b| match (a.located_at, b.located_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Highest occupancy first. Stable, so ties keep warehouse order.
pub fn sort_by_occupancy(summaries: &mut [WarehouseSummary]) {
    summaries.sort_by(|a, b| b.occupancy_percentage.cmp(&a.occupancy_percentage));
}

fn within(
    located_at: Option<DateTime<Utc>>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(at) = located_at else {
        return false;
    };
    from.map_or(true, |from| at >= from) && to.map_or(true, |to| at <= to)
}

fn text_matches(value: &str, filter: &Option<String>) -> bool {
    match filter.as_deref() {
        Some(term) if !term.is_empty() => contains_ignore_case(value, term),
        _ => true,
    }
}

#[derive(Clone)]
pub struct GeolocationService {
    store: Arc<dyn InventoryStore>,
    registry: SlotRegistry,
    reports: OccupancyReport,
}

impl GeolocationService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            registry: SlotRegistry::new(store.clone()),
            reports: OccupancyReport::new(store.clone()),
            store,
        }
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn reports(&self) -> &OccupancyReport {
        &self.reports
    }

    // --- lookups -----------------------------------------------------------

    pub async fn find_by_sku_code(&self, code: &str) -> ApiResponse<SkuLookup> {
        match self.lookup_sku(code.trim()).await {
            Ok(lookup) => {
                let message = if lookup.is_located() {
                    "SKU found with location"
                } else {
                    "SKU found but has no assigned location"
                };
                ApiResponse::ok(lookup).with_message(message)
            }
            Err(err) => ApiResponse::from_result("Error looking up SKU by code", Err(err)),
        }
    }

    async fn lookup_sku(&self, code: &str) -> GeoResult<SkuLookup> {
        let sku = self
            .store
            .sku_by_code(code)
            .await?
            .ok_or_else(|| GeoError::not_found("SKU not found"))?;

        let Some(slot) = self.registry.get_by_sku(sku.id).await? else {
            return Ok(SkuLookup::Unlocated { sku });
        };
        let warehouse_name = self
            .store
            .warehouse_by_id(slot.warehouse_id)
            .await?
            .map(|w| w.name)
            .unwrap_or_default();

        let location = SlotDetail {
            id: slot.id,
            sku_id: sku.id,
            sku_code: sku.code.clone(),
            sku_description: sku.description.clone(),
            container_id: sku.container_id,
            registered_at: sku.registered_at,
            warehouse_id: slot.warehouse_id,
            warehouse_name,
            rack: slot.rack,
            level: slot.level,
            aisle: slot.aisle,
            located_at: slot.located_at,
            location_code: String::new(),
        }
        .with_location_code();
        Ok(SkuLookup::Located { sku, location })
    }

    pub async fn search_skus_by_description(
        &self,
        term: &str,
    ) -> ApiResponse<Vec<SkuWithLocation>> {
        let result: GeoResult<_> = async {
            let skus = self.store.search_skus_by_description(term.trim()).await?;
            let mut found = Vec::with_capacity(skus.len());
            for sku in skus {
                let assignment = self.registry.get_by_sku(sku.id).await?;
                found.push(SkuWithLocation {
                    located: assignment.is_some(),
                    assignment,
                    sku,
                });
            }
            Ok(found)
        }
        .await;
        ApiResponse::from_result("Error searching SKUs by description", result)
    }

    // --- commands ----------------------------------------------------------

    /// Checks run in this order: duplicate code, malformed code, missing
    /// warehouse, bad coordinates, occupied slot. Either both rows are written or neither.
    pub async fn create_sku_with_location(
        &self,
        request: NewSkuWithLocation,
    ) -> ApiResponse<SkuWithAssignment> {
        let result: GeoResult<_> = async {
            let new_sku = NewSku::new(request.code, request.description, request.container_id);
            if self.store.sku_code_exists(&new_sku.code).await? {
                return Err(GeoError::conflict("A SKU with this code already exists"));
            }
            new_sku.validate()?;
            if self.store.warehouse_by_id(request.warehouse_id).await?.is_none() {
                return Err(GeoError::not_found("Warehouse not found"));
            }
            let location = Location::new(&request.rack, &request.level, &request.aisle)?;
            let (sku, assignment) = self
                .registry
                .register_with_slot(&new_sku, request.warehouse_id, location)
                .await?;
            Ok(SkuWithAssignment { sku, assignment })
        }
        .await;
        ApiResponse::from_result("Error creating SKU with location", result)
    }

    pub async fn move_sku(
        &self,
        sku_id: i32,
        target: LocationRequest,
    ) -> ApiResponse<SlotAssignment> {
        let result = self
            .registry
            .move_sku(sku_id, target.warehouse_id, &target.rack, &target.level, &target.aisle)
            .await;
        ApiResponse::from_result("Error moving SKU", result)
    }

    pub async fn clear_location(&self, sku_id: i32) -> ApiResponse<bool> {
        match self.registry.vacate(sku_id).await {
            Ok(true) => ApiResponse::ok(true).with_message("Location removed"),
            Ok(false) => ApiResponse::failure("Location could not be removed"),
            Err(err) => ApiResponse::from_result("Error clearing SKU location", Err(err)),
        }
    }

    pub async fn register_sku(&self, new_sku: NewSku) -> ApiResponse<Sku> {
        let result: GeoResult<_> = async {
            let new_sku = NewSku::new(new_sku.code, new_sku.description, new_sku.container_id);
            new_sku.validate()?;
            if self.store.sku_code_exists(&new_sku.code).await? {
                return Err(GeoError::conflict("A SKU with this code already exists"));
            }
            self.store.create_sku(&new_sku).await
        }
        .await;
        ApiResponse::from_result("Error registering SKU", result)
    }

    pub async fn create_warehouse(&self, new_warehouse: NewWarehouse) -> ApiResponse<Warehouse> {
        let result: GeoResult<_> = async {
            let new_warehouse = NewWarehouse::new(new_warehouse.name, new_warehouse.capacity);
            new_warehouse.validate()?;
            if self.store.warehouse_name_exists(&new_warehouse.name).await? {
                return Err(GeoError::conflict("A warehouse with this name already exists"));
            }
            self.store.create_warehouse(&new_warehouse).await
        }
        .await;
        ApiResponse::from_result("Error creating warehouse", result)
    }

    pub async fn list_warehouses(&self) -> ApiResponse<Vec<Warehouse>> {
        ApiResponse::from_result("Error listing warehouses", self.store.warehouses().await)
    }

    // --- listings ----------------------------------------------------------

    pub async fn list_locations(&self, filter: LocationFilter) -> ApiResponse<Vec<SlotDetail>> {
        let result: GeoResult<_> = async {
            let mut details: Vec<SlotDetail> = self
                .store
                .find_slot_details(&SlotQuery::all().in_warehouse(filter.warehouse_id))
                .await?
                .into_iter()
                .filter(|d| {
                    text_matches(&d.rack, &filter.rack)
                        && text_matches(&d.level, &filter.level)
                        && text_matches(&d.aisle, &filter.aisle)
                        && text_matches(&d.sku_code, &filter.sku_code)
                        && within(d.located_at, filter.from, filter.to)
                })
                .collect();
            sort_by_warehouse_and_code(&mut details);
            Ok(details)
        }
        .await;
        ApiResponse::from_result("Error listing locations", result)
    }

    pub async fn list_located_skus(
        &self,
        filter: LocatedSkuFilter,
    ) -> ApiResponse<Vec<SlotDetail>> {
        let result: GeoResult<_> = async {
            let mut details: Vec<SlotDetail> = self
                .store
                .find_slot_details(&SlotQuery::all().in_warehouse(filter.warehouse_id))
                .await?
                .into_iter()
                .filter(|d| {
                    text_matches(&d.rack, &filter.rack)
                        && text_matches(&d.aisle, &filter.aisle)
                        && text_matches(&d.sku_code, &filter.sku_code)
                        && text_matches(
                            d.sku_description.as_deref().unwrap_or(""),
                            &filter.description,
                        )
                        && within(d.located_at, filter.from, filter.to)
                })
                .collect();
            sort_by_recency(&mut details);
            Ok(details)
        }
        .await;
        ApiResponse::from_result("Error listing located SKUs", result)
    }

    pub async fn list_skus_by_warehouse(&self, warehouse_id: i32) -> ApiResponse<Vec<SlotDetail>> {
        self.list_located_skus(LocatedSkuFilter {
            warehouse_id: Some(warehouse_id),
            ..LocatedSkuFilter::default()
        })
        .await
    }

    pub async fn search_by_coordinate_fragment(
        &self,
        term: &str,
        warehouse_id: Option<i32>,
    ) -> ApiResponse<Vec<SlotDetail>> {
        let query = SlotQuery::rack_fragment(term.trim()).in_warehouse(warehouse_id);
        let result = self.sorted_details(&query).await;
        ApiResponse::from_result("Error searching locations", result)
    }

    pub async fn list_by_rack(
        &self,
        rack: &str,
        warehouse_id: Option<i32>,
    ) -> ApiResponse<Vec<SlotDetail>> {
        let query = SlotQuery::rack(rack.trim()).in_warehouse(warehouse_id);
        let result = self.sorted_details(&query).await;
        ApiResponse::from_result("Error listing rack locations", result)
    }

    pub async fn list_by_aisle(
        &self,
        aisle: &str,
        warehouse_id: Option<i32>,
    ) -> ApiResponse<Vec<SlotDetail>> {
        let query = SlotQuery::aisle(aisle.trim()).in_warehouse(warehouse_id);
        let result = self.sorted_details(&query).await;
        ApiResponse::from_result("Error listing aisle locations", result)
    }

    async fn sorted_details(&self, query: &SlotQuery) -> GeoResult<Vec<SlotDetail>> {
        let mut details = self.store.find_slot_details(query).await?;
        sort_by_warehouse_and_code(&mut details);
        Ok(details)
    }

    // --- reports -----------------------------------------------------------

    async fn warehouse(&self, warehouse_id: i32) -> GeoResult<Warehouse> {
        self.store
            .warehouse_by_id(warehouse_id)
            .await?
            .ok_or_else(|| GeoError::not_found("Warehouse not found"))
    }

    pub async fn occupancy_map(&self, warehouse_id: i32) -> ApiResponse<WarehouseOccupancy> {
        let result: GeoResult<_> = async {
            let warehouse = self.warehouse(warehouse_id).await?;
            let map = self.reports.occupancy_map(warehouse_id).await?;
            Ok(WarehouseOccupancy { warehouse, map })
        }
        .await;
        ApiResponse::from_result("Error building occupancy map", result)
    }

    pub async fn warehouse_statistics(&self, warehouse_id: i32) -> ApiResponse<WarehouseOverview> {
        let result: GeoResult<_> = async {
            let warehouse = self.warehouse(warehouse_id).await?;
            let summary = self.reports.summary(&warehouse).await?;
            let statistics = self.reports.statistics(warehouse_id).await?;
            Ok(WarehouseOverview { summary, statistics })
        }
        .await;
        ApiResponse::from_result("Error computing warehouse statistics", result)
    }

    pub async fn warehouse_summary_all(&self) -> ApiResponse<Vec<WarehouseSummary>> {
        let result: GeoResult<_> = async {
            let mut summaries = Vec::new();
            for warehouse in self.store.warehouses().await? {
                summaries.push(self.reports.summary(&warehouse).await?);
            }
            sort_by_occupancy(&mut summaries);
            Ok(summaries)
        }
        .await;
        ApiResponse::from_result("Error summarizing warehouses", result)
    }

    pub async fn available_locations(&self, warehouse_id: i32) -> ApiResponse<WarehouseLocations> {
        let result: GeoResult<_> = async {
            let warehouse = self.warehouse(warehouse_id).await?;
            let occupied = self.reports.occupied_locations(warehouse_id).await?;
            Ok(WarehouseLocations { warehouse, occupied })
        }
        .await;
        ApiResponse::from_result("Error listing occupied locations", result)
    }

    pub async fn check_location(&self, request: LocationRequest) -> ApiResponse<LocationCheck> {
        let result: GeoResult<_> = async {
            let location = Location::new(&request.rack, &request.level, &request.aisle)?;
            let occupied = self
                .registry
                .is_occupied(request.warehouse_id, &location, None)
                .await?;
            let location_code = location.code();
            let message = if occupied {
                format!("Location {} is occupied", location_code)
            } else {
                format!("Location {} is available", location_code)
            };
            Ok(LocationCheck {
                available: !occupied,
                location_code,
                message,
            })
        }
        .await;
        ApiResponse::from_result("Error checking location", result)
    }

    pub fn validate_location_format(
        &self,
        rack: &str,
        level: &str,
        aisle: &str,
    ) -> ApiResponse<LocationValidation> {
        let valid = codec::validate(rack, level, aisle);
        let location_code = match Location::new(rack, level, aisle) {
            Ok(location) => location.code(),
            Err(_) => codec::format(rack, level, aisle),
        };
        let message = if valid {
            format!("Valid format: {}", location_code)
        } else {
            "Invalid location format".to_string()
        };
        ApiResponse::ok(LocationValidation {
            valid,
            location_code,
            message,
        })
    }

    pub async fn sku_statistics(&self) -> ApiResponse<SkuStatistics> {
        let result: GeoResult<_> = async {
            let total = self.store.all_skus().await?.len();
            let located = self.store.find_slot_details(&SlotQuery::all()).await?.len();
            Ok(SkuStatistics::new(total, located))
        }
        .await;
        ApiResponse::from_result("Error computing SKU statistics", result)
    }
}
