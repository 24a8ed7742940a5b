use std::sync::Arc;

use crate::{
    error::{GeoError, GeoResult},
    models::{NewSku, Placement, Sku, SlotAssignment},
    store::{occupied_message, InventoryStore},
};

use super::codec::Location;

/// Sole writer of slot assignments.
///
/// Every write first runs the occupancy check so callers get a precise
/// message, then relies on the store to reject anything that slipped in
/// between check and write.
#[derive(Clone)]
pub struct SlotRegistry {
    store: Arc<dyn InventoryStore>,
}

impl SlotRegistry {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_warehouse(&self, warehouse_id: i32) -> GeoResult<Vec<SlotAssignment>> {
        self.store.slots_by_warehouse(warehouse_id).await
    }

    pub async fn get_by_sku(&self, sku_id: i32) -> GeoResult<Option<SlotAssignment>> {
        self.store.slot_by_sku(sku_id).await
    }

    /// `excluding` lets a move ignore the assignment being moved.
    pub async fn is_occupied(
        &self,
        warehouse_id: i32,
        location: &Location,
        excluding: Option<i32>,
    ) -> GeoResult<bool> {
        let occupant = self.store.slot_at(warehouse_id, location).await?;
        Ok(occupant.is_some_and(|slot| Some(slot.id) != excluding))
    }

    /// Slots a SKU. A SKU that is already located is moved instead, so it never
    /// ends up with two assignments.
    pub async fn assign(
        &self,
        sku_id: i32,
        warehouse_id: i32,
        rack: &str,
        level: &str,
        aisle: &str,
    ) -> GeoResult<SlotAssignment> {
        let slot = self.locate(sku_id, warehouse_id, rack, level, aisle).await?;
        log::info!(
            "Assigned SKU {} to {} in warehouse {}",
            sku_id,
            slot.location_code(),
            warehouse_id
        );
        Ok(slot)
    }

    /// Same write path as [`assign`](Self::assign); the slot row of a located
    /// SKU keeps its id.
    pub async fn move_sku(
        &self,
        sku_id: i32,
        warehouse_id: i32,
        rack: &str,
        level: &str,
        aisle: &str,
    ) -> GeoResult<SlotAssignment> {
        let slot = self.locate(sku_id, warehouse_id, rack, level, aisle).await?;
        log::info!(
            "Moved SKU {} to {} in warehouse {}",
            sku_id,
            slot.location_code(),
            warehouse_id
        );
        Ok(slot)
    }

    /// Returns whether an assignment was removed. Unlocated SKUs are not an error.
    pub async fn vacate(&self, sku_id: i32) -> GeoResult<bool> {
        let removed = self.store.delete_slot_for_sku(sku_id).await?;
        if removed {
            log::info!("Cleared location of SKU {}", sku_id);
        }
        Ok(removed)
    }

    /// Registers a new SKU and its first slot as one unit.
    pub async fn register_with_slot(
        &self,
        new_sku: &NewSku,
        warehouse_id: i32,
        location: Location,
    ) -> GeoResult<(Sku, SlotAssignment)> {
        if self.is_occupied(warehouse_id, &location, None).await? {
            return Err(GeoError::conflict(occupied_message(&location)));
        }
        let (sku, slot) = self
            .store
            .create_sku_with_slot(new_sku, &Placement::now(warehouse_id, location))
            .await?;
        log::info!(
            "Registered SKU {} at {} in warehouse {}",
            sku.code,
            slot.location_code(),
            warehouse_id
        );
        Ok((sku, slot))
    }

    async fn locate(
        &self,
        sku_id: i32,
        warehouse_id: i32,
        rack: &str,
        level: &str,
        aisle: &str,
    ) -> GeoResult<SlotAssignment> {
        let location = Location::new(rack, level, aisle)?;
        self.ensure_references(sku_id, warehouse_id).await?;
        self.place(sku_id, Placement::now(warehouse_id, location)).await
    }

    async fn ensure_references(&self, sku_id: i32, warehouse_id: i32) -> GeoResult<()> {
        if self.store.sku_by_id(sku_id).await?.is_none() {
            return Err(GeoError::not_found(format!("SKU {} not found", sku_id)));
        }
        if self.store.warehouse_by_id(warehouse_id).await?.is_none() {
            return Err(GeoError::not_found(format!("Warehouse {} not found", warehouse_id)));
        }
        Ok(())
    }

    async fn place(&self, sku_id: i32, placement: Placement) -> GeoResult<SlotAssignment> {
        let current = self.store.slot_by_sku(sku_id).await?;
        let current_id = current.as_ref().map(|slot| slot.id);

        if self
            .is_occupied(placement.warehouse_id, &placement.location, current_id)
            .await?
        {
            return Err(GeoError::conflict(occupied_message(&placement.location)));
        }

        // A concurrent first assignment of the same SKU may land between the
        // lookup and the write; insert_slot then rewrites that row.
        match current_id {
            Some(slot_id) => self.store.update_slot(slot_id, &placement).await,
            None => self.store.insert_slot(sku_id, &placement).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::NewWarehouse,
        store::{MemoryStore, SkuRegistry, WarehouseRegistry},
    };
    use tokio::sync::Barrier;

    struct Fixture {
        registry: SlotRegistry,
        store: Arc<MemoryStore>,
        warehouse_a: i32,
        warehouse_b: i32,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let warehouse_a = store
            .create_warehouse(&NewWarehouse::new("General", None))
            .await
            .unwrap()
            .id;
        let warehouse_b = store
            .create_warehouse(&NewWarehouse::new("Telephony", None))
            .await
            .unwrap()
            .id;
        Fixture {
            registry: SlotRegistry::new(store.clone()),
            store,
            warehouse_a,
            warehouse_b,
        }
    }

    async fn sku(store: &MemoryStore, code: &str) -> i32 {
        store.create_sku(&NewSku::new(code, None, None)).await.unwrap().id
    }

    #[tokio::test]
    async fn second_sku_cannot_take_an_occupied_slot() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;
        let second = sku(&f.store, "SKU2").await;

        f.registry.assign(first, f.warehouse_a, "A1", "02", "03").await.unwrap();
        let err = f
            .registry
            .assign(second, f.warehouse_a, "A1", "02", "03")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Location A1-02-03 is already occupied");
        assert!(f.registry.get_by_sku(second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_coordinates_in_another_warehouse_are_free() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;
        let second = sku(&f.store, "SKU2").await;

        f.registry.assign(first, f.warehouse_a, "A1", "02", "03").await.unwrap();
        f.registry.assign(second, f.warehouse_b, "A1", "02", "03").await.unwrap();
    }

    #[tokio::test]
    async fn assign_validates_before_touching_the_store() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;

        let err = f.registry.assign(first, f.warehouse_a, "", "02", "03").await.unwrap_err();
        assert!(err.is_validation());
        let err = f.registry.assign(999, f.warehouse_a, "A1", "02", "03").await.unwrap_err();
        assert!(err.is_not_found());
        let err = f.registry.assign(first, 999, "A1", "02", "03").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn reassigning_a_located_sku_moves_it() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;

        let original = f.registry.assign(first, f.warehouse_a, "A1", "02", "03").await.unwrap();
        let moved = f.registry.assign(first, f.warehouse_a, "A1", "02", "04").await.unwrap();

        assert_eq!(original.id, moved.id);
        assert_eq!(f.registry.get_by_warehouse(f.warehouse_a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn move_to_another_warehouse_frees_the_source() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;
        let second = sku(&f.store, "SKU2").await;
        f.registry.assign(first, f.warehouse_a, "A1", "02", "03").await.unwrap();

        let moved = f
            .registry
            .move_sku(first, f.warehouse_b, "B1", "01", "05")
            .await
            .unwrap();
        assert_eq!(moved.warehouse_id, f.warehouse_b);

        let location = Location::new("A1", "02", "03").unwrap();
        assert!(!f.registry.is_occupied(f.warehouse_a, &location, None).await.unwrap());
        f.registry.assign(second, f.warehouse_a, "A1", "02", "03").await.unwrap();
    }

    #[tokio::test]
    async fn move_onto_its_own_slot_is_allowed() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;
        let slot = f.registry.assign(first, f.warehouse_a, "A1", "02", "03").await.unwrap();

        let same = f
            .registry
            .move_sku(first, f.warehouse_a, "A1", "02", "03")
            .await
            .unwrap();
        assert_eq!(same.id, slot.id);
    }

    #[tokio::test]
    async fn move_creates_an_assignment_for_unlocated_skus() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;

        let slot = f
            .registry
            .move_sku(first, f.warehouse_b, "B1", "01", "05")
            .await
            .unwrap();
        assert_eq!(f.registry.get_by_sku(first).await.unwrap(), Some(slot));
    }

    #[tokio::test]
    async fn is_occupied_honours_the_exclusion() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;
        let slot = f.registry.assign(first, f.warehouse_a, "A1", "02", "03").await.unwrap();
        let location = Location::new("A1", "02", "03").unwrap();

        assert!(f.registry.is_occupied(f.warehouse_a, &location, None).await.unwrap());
        assert!(!f
            .registry
            .is_occupied(f.warehouse_a, &location, Some(slot.id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn vacate_is_idempotent() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;
        f.registry.assign(first, f.warehouse_a, "A1", "02", "03").await.unwrap();

        assert!(f.registry.vacate(first).await.unwrap());
        assert!(!f.registry.vacate(first).await.unwrap());
        assert!(f.registry.get_by_sku(first).await.unwrap().is_none());
        assert!(f.store.sku_by_id(first).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_assigns_to_one_slot_yield_one_winner() {
        let f = fixture().await;
        let mut skus = Vec::new();
        for i in 0..16 {
            skus.push(sku(&f.store, &format!("SKU{}", i)).await);
        }

        let mut tasks = Vec::new();
        for sku_id in skus {
            let registry = f.registry.clone();
            let warehouse = f.warehouse_a;
            tasks.push(tokio::spawn(async move {
                registry.assign(sku_id, warehouse, "A1", "02", "03").await.is_ok()
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(f.registry.get_by_warehouse(f.warehouse_a).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_moves_onto_one_slot_yield_one_winner() {
        let f = fixture().await;
        let mut skus = Vec::new();
        for i in 0..8 {
            let sku_id = sku(&f.store, &format!("SKU{}", i)).await;
            let aisle = format!("{:02}", i);
            f.registry.assign(sku_id, f.warehouse_a, "A1", "01", &aisle).await.unwrap();
            skus.push(sku_id);
        }

        let barrier = Arc::new(Barrier::new(skus.len()));
        let mut tasks = Vec::new();
        for sku_id in skus {
            let registry = f.registry.clone();
            let barrier = barrier.clone();
            let warehouse = f.warehouse_b;
            tasks.push(tokio::spawn(async move {
                barrier.wait().await;
                registry.move_sku(sku_id, warehouse, "Z9", "01", "01").await
            }));
        }

        let mut winners = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => winners += 1,
                Err(err) => assert!(err.is_conflict(), "unexpected error: {}", err),
            }
        }
        assert_eq!(winners, 1);

        let destination = f.registry.get_by_warehouse(f.warehouse_b).await.unwrap();
        assert_eq!(destination.len(), 1);
        assert_eq!(destination[0].location_code(), "Z9-01-01");
        assert_eq!(f.registry.get_by_warehouse(f.warehouse_a).await.unwrap().len(), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_assigns_of_one_sku_all_land() {
        let f = fixture().await;
        let first = sku(&f.store, "SKU1").await;

        let barrier = Arc::new(Barrier::new(8));
        let mut tasks = Vec::new();
        for i in 0..8 {
            let registry = f.registry.clone();
            let barrier = barrier.clone();
            let warehouse = f.warehouse_a;
            tasks.push(tokio::spawn(async move {
                barrier.wait().await;
                let aisle = format!("{:02}", i);
                registry.assign(first, warehouse, "A1", "01", &aisle).await
            }));
        }

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let slots = f.registry.get_by_warehouse(f.warehouse_a).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].sku_id, first);
    }
}
