//! Storage seams for the geolocation core.
//!
//! The SKU and warehouse registries belong to the wider application; the slot
//! table belongs to the [`SlotRegistry`](crate::geolocation::SlotRegistry),
//! which is the only caller of the slot write methods.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::GeoResult,
    geolocation::codec::Location,
    models::{NewSku, NewWarehouse, Placement, Sku, SlotAssignment, SlotDetail, Warehouse},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait SkuRegistry: Send + Sync {
    async fn sku_by_id(&self, id: i32) -> GeoResult<Option<Sku>>;

    async fn sku_by_code(&self, code: &str) -> GeoResult<Option<Sku>>;

    async fn sku_code_exists(&self, code: &str) -> GeoResult<bool> {
        Ok(self.sku_by_code(code).await?.is_some())
    }

    /// Fails with `Conflict` when the code is taken.
    async fn create_sku(&self, new_sku: &NewSku) -> GeoResult<Sku>;

    async fn all_skus(&self) -> GeoResult<Vec<Sku>>;

    /// Case-insensitive substring match on the description.
    async fn search_skus_by_description(&self, term: &str) -> GeoResult<Vec<Sku>>;
}

#[async_trait]
pub trait WarehouseRegistry: Send + Sync {
    async fn warehouse_by_id(&self, id: i32) -> GeoResult<Option<Warehouse>>;

    /// Ordered by id.
    async fn warehouses(&self) -> GeoResult<Vec<Warehouse>>;

    async fn warehouse_name_exists(&self, name: &str) -> GeoResult<bool>;

    /// Fails with `Conflict` when the name is taken.
    async fn create_warehouse(&self, new_warehouse: &NewWarehouse) -> GeoResult<Warehouse>;
}

/// Filters for joined slot reads. Empty query means every assignment.
#[derive(Debug, Clone, Default)]
pub struct SlotQuery {
    pub warehouse_id: Option<i32>,
    pub rack: Option<String>,
    pub aisle: Option<String>,
    /// Case-insensitive substring of the rack label.
    pub rack_fragment: Option<String>,
}

impl SlotQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn warehouse(warehouse_id: i32) -> Self {
        Self {
            warehouse_id: Some(warehouse_id),
            ..Self::default()
        }
    }

    pub fn in_warehouse(mut self, warehouse_id: Option<i32>) -> Self {
        self.warehouse_id = warehouse_id;
        self
    }

    pub fn rack(rack: &str) -> Self {
        Self {
            rack: Some(rack.to_string()),
            ..Self::default()
        }
    }

    pub fn aisle(aisle: &str) -> Self {
        Self {
            aisle: Some(aisle.to_string()),
            ..Self::default()
        }
    }

    pub fn rack_fragment(term: &str) -> Self {
        Self {
            rack_fragment: Some(term.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, slot: &SlotAssignment) -> bool {
        self.warehouse_id.map_or(true, |id| slot.warehouse_id == id)
            && self.rack.as_deref().map_or(true, |rack| slot.rack == rack)
            && self.aisle.as_deref().map_or(true, |aisle| slot.aisle == aisle)
            && self
                .rack_fragment
                .as_deref()
                .map_or(true, |term| contains_ignore_case(&slot.rack, term))
    }
}

/// Slot-assignment table. Writes must enforce both uniqueness rules
/// atomically and report violations as `Conflict`.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn slots_by_warehouse(&self, warehouse_id: i32) -> GeoResult<Vec<SlotAssignment>>;

    async fn slot_by_sku(&self, sku_id: i32) -> GeoResult<Option<SlotAssignment>>;

    async fn slot_at(
        &self,
        warehouse_id: i32,
        location: &Location,
    ) -> GeoResult<Option<SlotAssignment>>;

    /// Writes the SKU's assignment. If the SKU already has one, that row is
    /// rewritten in place instead of failing on the one-slot-per-SKU rule.
    async fn insert_slot(&self, sku_id: i32, placement: &Placement) -> GeoResult<SlotAssignment>;

    /// Rewrites warehouse, coordinates and timestamp of an existing row.
    async fn update_slot(&self, slot_id: i32, placement: &Placement) -> GeoResult<SlotAssignment>;

    async fn delete_slot_for_sku(&self, sku_id: i32) -> GeoResult<bool>;

    /// Ordered by assignment id.
    async fn find_slot_details(&self, query: &SlotQuery) -> GeoResult<Vec<SlotDetail>>;

    /// Creates the SKU and its first assignment in one unit; on any failure
    /// neither row exists afterwards.
    async fn create_sku_with_slot(
        &self,
        new_sku: &NewSku,
        placement: &Placement,
    ) -> GeoResult<(Sku, SlotAssignment)>;
}

pub trait InventoryStore: SkuRegistry + WarehouseRegistry + SlotStore {}

impl<T: SkuRegistry + WarehouseRegistry + SlotStore> InventoryStore for T {}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn occupied_message(location: &Location) -> String {
    format!("Location {} is already occupied", location.code())
}
