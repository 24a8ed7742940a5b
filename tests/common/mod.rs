#![allow(dead_code)]

use std::sync::Arc;

use slotwise::{
    geolocation::{LocationRequest, NewSkuWithLocation},
    models::{NewSku, NewWarehouse, Sku, Warehouse},
    store::{MemoryStore, SkuRegistry, WarehouseRegistry},
    GeolocationService,
};

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub geo: GeolocationService,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let geo = GeolocationService::new(store.clone());
        Self { store, geo }
    }

    pub async fn warehouse(&self, name: &str) -> Warehouse {
        self.store
            .create_warehouse(&NewWarehouse::new(name, None))
            .await
            .expect("create warehouse")
    }

    pub async fn warehouse_with_capacity(&self, name: &str, capacity: i32) -> Warehouse {
        self.store
            .create_warehouse(&NewWarehouse::new(name, Some(capacity)))
            .await
            .expect("create warehouse")
    }

    pub async fn sku(&self, code: &str, description: &str) -> Sku {
        self.store
            .create_sku(&NewSku::new(code, Some(description.to_string()), None))
            .await
            .expect("create sku")
    }
}

pub fn target(warehouse_id: i32, rack: &str, level: &str, aisle: &str) -> LocationRequest {
    LocationRequest {
        warehouse_id,
        rack: rack.to_string(),
        level: level.to_string(),
        aisle: aisle.to_string(),
    }
}

pub fn new_sku_at(
    code: &str,
    warehouse_id: i32,
    rack: &str,
    level: &str,
    aisle: &str,
) -> NewSkuWithLocation {
    NewSkuWithLocation {
        code: code.to_string(),
        description: Some(format!("{} description", code)),
        container_id: None,
        warehouse_id,
        rack: rack.to_string(),
        level: level.to_string(),
        aisle: aisle.to_string(),
    }
}
