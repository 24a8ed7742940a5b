use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{GeoError, GeoResult},
    geolocation::codec::Location,
    models::{NewSku, NewWarehouse, Placement, Sku, SlotAssignment, SlotDetail, Warehouse},
};

use super::{
    contains_ignore_case, occupied_message, SkuRegistry, SlotQuery, SlotStore, WarehouseRegistry,
};

#[derive(Debug, Default)]
struct Tables {
    skus: Vec<Sku>,
    warehouses: Vec<Warehouse>,
    slots: Vec<SlotAssignment>,
    next_sku_id: i32,
    next_warehouse_id: i32,
    next_slot_id: i32,
}

impl Tables {
    fn sku(&self, id: i32) -> Option<&Sku> {
        self.skus.iter().find(|s| s.id == id)
    }

    fn warehouse(&self, id: i32) -> Option<&Warehouse> {
        self.warehouses.iter().find(|w| w.id == id)
    }

    /// Same checks the unique and foreign-key constraints make in PostgreSQL.
    fn check_placement(
        &self,
        sku_id: i32,
        slot_id: Option<i32>,
        placement: &Placement,
    ) -> GeoResult<()> {
        if self.sku(sku_id).is_none() {
            return Err(GeoError::not_found(format!("SKU {} not found", sku_id)));
        }
        if self.warehouse(placement.warehouse_id).is_none() {
            return Err(GeoError::not_found(format!(
                "Warehouse {} not found",
                placement.warehouse_id
            )));
        }
        let taken = self.slots.iter().any(|slot| {
            Some(slot.id) != slot_id && slot.is_at(placement.warehouse_id, &placement.location)
        });
        if taken {
            return Err(GeoError::conflict(occupied_message(&placement.location)));
        }
        Ok(())
    }

    fn insert_sku(&mut self, new_sku: &NewSku) -> GeoResult<Sku> {
        if self.skus.iter().any(|s| s.code == new_sku.code) {
            return Err(GeoError::conflict("A SKU with this code already exists"));
        }
        self.next_sku_id += 1;
        let sku = Sku {
            id: self.next_sku_id,
            code: new_sku.code.clone(),
            description: new_sku.description.clone(),
            container_id: new_sku.container_id,
            registered_at: Utc::now(),
        };
        self.skus.push(sku.clone());
        Ok(sku)
    }

    /// Upsert keyed on the SKU, like `ON CONFLICT (sku_id)` in PostgreSQL.
    fn insert_slot(&mut self, sku_id: i32, placement: &Placement) -> GeoResult<SlotAssignment> {
        let existing = self.slots.iter().position(|slot| slot.sku_id == sku_id);
        self.check_placement(sku_id, existing.map(|index| self.slots[index].id), placement)?;
        if let Some(index) = existing {
            return Ok(self.rewrite_slot(index, placement));
        }
        self.next_slot_id += 1;
        let slot = SlotAssignment {
            id: self.next_slot_id,
            sku_id,
            warehouse_id: placement.warehouse_id,
            rack: placement.location.rack.to_string(),
            level: placement.location.level.to_string(),
            aisle: placement.location.aisle.to_string(),
            located_at: Some(placement.located_at),
        };
        self.slots.push(slot.clone());
        Ok(slot)
    }

    fn rewrite_slot(&mut self, index: usize, placement: &Placement) -> SlotAssignment {
        let slot = &mut self.slots[index];
        slot.warehouse_id = placement.warehouse_id;
        slot.rack = placement.location.rack.to_string();
        slot.level = placement.location.level.to_string();
        slot.aisle = placement.location.aisle.to_string();
        slot.located_at = Some(placement.located_at);
        slot.clone()
    }

    fn detail(&self, slot: &SlotAssignment) -> Option<SlotDetail> {
        let sku = self.sku(slot.sku_id)?;
        let warehouse = self.warehouse(slot.warehouse_id)?;
        let detail = SlotDetail {
            id: slot.id,
            sku_id: sku.id,
            sku_code: sku.code.clone(),
            sku_description: sku.description.clone(),
            container_id: sku.container_id,
            registered_at: sku.registered_at,
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name.clone(),
            rack: slot.rack.clone(),
            level: slot.level.clone(),
            aisle: slot.aisle.clone(),
            located_at: slot.located_at,
            location_code: String::new(),
        };
        Some(detail.with_location_code())
    }
}

/// In-process store. A single lock over all tables serializes every write, so
/// check and insert happen as one step.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SkuRegistry for MemoryStore {
    async fn sku_by_id(&self, id: i32) -> GeoResult<Option<Sku>> {
        Ok(self.tables.read().await.sku(id).cloned())
    }

    async fn sku_by_code(&self, code: &str) -> GeoResult<Option<Sku>> {
        let tables = self.tables.read().await;
        Ok(tables.skus.iter().find(|s| s.code == code).cloned())
    }

    async fn create_sku(&self, new_sku: &NewSku) -> GeoResult<Sku> {
        self.tables.write().await.insert_sku(new_sku)
    }

    async fn all_skus(&self) -> GeoResult<Vec<Sku>> {
        Ok(self.tables.read().await.skus.clone())
    }

    async fn search_skus_by_description(&self, term: &str) -> GeoResult<Vec<Sku>> {
        let tables = self.tables.read().await;
        Ok(tables
            .skus
            .iter()
            .filter(|s| {
                s.description
                    .as_deref()
                    .is_some_and(|d| contains_ignore_case(d, term))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WarehouseRegistry for MemoryStore {
    async fn warehouse_by_id(&self, id: i32) -> GeoResult<Option<Warehouse>> {
        Ok(self.tables.read().await.warehouse(id).cloned())
    }

    async fn warehouses(&self) -> GeoResult<Vec<Warehouse>> {
        Ok(self.tables.read().await.warehouses.clone())
    }

    async fn warehouse_name_exists(&self, name: &str) -> GeoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.warehouses.iter().any(|w| w.name == name))
    }

    async fn create_warehouse(&self, new_warehouse: &NewWarehouse) -> GeoResult<Warehouse> {
        let mut tables = self.tables.write().await;
        if tables.warehouses.iter().any(|w| w.name == new_warehouse.name) {
            return Err(GeoError::conflict("A warehouse with this name already exists"));
        }
        tables.next_warehouse_id += 1;
        let warehouse = Warehouse {
            id: tables.next_warehouse_id,
            name: new_warehouse.name.clone(),
            capacity: new_warehouse.capacity,
        };
        tables.warehouses.push(warehouse.clone());
        Ok(warehouse)
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn slots_by_warehouse(&self, warehouse_id: i32) -> GeoResult<Vec<SlotAssignment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .slots
            .iter()
            .filter(|slot| slot.warehouse_id == warehouse_id)
            .cloned()
            .collect())
    }

    async fn slot_by_sku(&self, sku_id: i32) -> GeoResult<Option<SlotAssignment>> {
        let tables = self.tables.read().await;
        Ok(tables.slots.iter().find(|slot| slot.sku_id == sku_id).cloned())
    }

    async fn slot_at(
        &self,
        warehouse_id: i32,
        location: &Location,
    ) -> GeoResult<Option<SlotAssignment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .slots
            .iter()
            .find(|slot| slot.is_at(warehouse_id, location))
            .cloned())
    }

    async fn insert_slot(&self, sku_id: i32, placement: &Placement) -> GeoResult<SlotAssignment> {
        self.tables.write().await.insert_slot(sku_id, placement)
    }

    async fn update_slot(&self, slot_id: i32, placement: &Placement) -> GeoResult<SlotAssignment> {
        let mut tables = self.tables.write().await;
        let index = tables
            .slots
            .iter()
            .position(|slot| slot.id == slot_id)
            .ok_or_else(|| GeoError::not_found(format!("Slot assignment {} not found", slot_id)))?;
        let sku_id = tables.slots[index].sku_id;
        tables.check_placement(sku_id, Some(slot_id), placement)?;
        Ok(tables.rewrite_slot(index, placement))
    }

    async fn delete_slot_for_sku(&self, sku_id: i32) -> GeoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.slots.len();
        tables.slots.retain(|slot| slot.sku_id != sku_id);
        Ok(tables.slots.len() < before)
    }

    async fn find_slot_details(&self, query: &SlotQuery) -> GeoResult<Vec<SlotDetail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .slots
            .iter()
            .filter(|slot| query.matches(slot))
            .filter_map(|slot| tables.detail(slot))
            .collect())
    }

    async fn create_sku_with_slot(
        &self,
        new_sku: &NewSku,
        placement: &Placement,
    ) -> GeoResult<(Sku, SlotAssignment)> {
        let mut tables = self.tables.write().await;
        if tables.warehouse(placement.warehouse_id).is_none() {
            return Err(GeoError::not_found(format!(
                "Warehouse {} not found",
                placement.warehouse_id
            )));
        }
        if tables
            .slots
            .iter()
            .any(|slot| slot.is_at(placement.warehouse_id, &placement.location))
        {
            return Err(GeoError::conflict(occupied_message(&placement.location)));
        }
        // Both checks above ran under the write lock, so the slot insert
        // cannot fail after the SKU row exists.
        let sku = tables.insert_sku(new_sku)?;
        let slot = tables.insert_slot(sku.id, placement)?;
        Ok((sku, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, Warehouse, Sku) {
        let store = MemoryStore::new();
        let warehouse = store
            .create_warehouse(&NewWarehouse::new("General", None))
            .await
            .unwrap();
        let sku = store.create_sku(&NewSku::new("SKU1", None, None)).await.unwrap();
        (store, warehouse, sku)
    }

    fn placement(warehouse_id: i32, rack: &str, level: &str, aisle: &str) -> Placement {
        Placement::now(warehouse_id, Location::new(rack, level, aisle).unwrap())
    }

    #[tokio::test]
    async fn duplicate_names_and_codes_conflict() {
        let (store, _, _) = seeded().await;
        let err = store
            .create_warehouse(&NewWarehouse::new("General", None))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        let err = store.create_sku(&NewSku::new("SKU1", None, None)).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn insert_enforces_slot_uniqueness() {
        let (store, warehouse, sku) = seeded().await;
        let other = store.create_sku(&NewSku::new("SKU2", None, None)).await.unwrap();
        store
            .insert_slot(sku.id, &placement(warehouse.id, "A1", "02", "03"))
            .await
            .unwrap();

        let err = store
            .insert_slot(other.id, &placement(warehouse.id, "A1", "02", "03"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn second_insert_for_a_sku_rewrites_its_slot() {
        let (store, warehouse, sku) = seeded().await;
        let first = store
            .insert_slot(sku.id, &placement(warehouse.id, "A1", "02", "03"))
            .await
            .unwrap();
        let second = store
            .insert_slot(sku.id, &placement(warehouse.id, "A1", "02", "04"))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.location_code(), "A1-02-04");
        let slots = store.slots_by_warehouse(warehouse.id).await.unwrap();
        assert_eq!(slots, vec![second]);
    }

    #[tokio::test]
    async fn insert_requires_existing_references() {
        let (store, warehouse, sku) = seeded().await;
        let err = store
            .insert_slot(999, &placement(warehouse.id, "A1", "02", "03"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = store
            .insert_slot(sku.id, &placement(999, "A1", "02", "03"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn failed_composite_create_leaves_no_sku() {
        let (store, warehouse, sku) = seeded().await;
        store
            .insert_slot(sku.id, &placement(warehouse.id, "A1", "02", "03"))
            .await
            .unwrap();

        let err = store
            .create_sku_with_slot(
                &NewSku::new("NEW1", None, None),
                &placement(warehouse.id, "A1", "02", "03"),
            )
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(store.sku_by_code("NEW1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn details_join_sku_and_warehouse() {
        let (store, warehouse, sku) = seeded().await;
        store
            .insert_slot(sku.id, &placement(warehouse.id, "A1", "02", "03"))
            .await
            .unwrap();

        let details = store.find_slot_details(&SlotQuery::rack_fragment("a")).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].sku_code, "SKU1");
        assert_eq!(details[0].warehouse_name, "General");
        assert_eq!(details[0].location_code, "A1-02-03");

        let none = store.find_slot_details(&SlotQuery::aisle("99")).await.unwrap();
        assert!(none.is_empty());
    }
}
