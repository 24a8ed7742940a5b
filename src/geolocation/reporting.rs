use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::GeoResult,
    models::{SlotAssignment, Warehouse},
    store::{InventoryStore, SlotQuery},
};

/// One assigned slot on a warehouse occupancy map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyEntry {
    pub rack: String,
    pub level: String,
    pub aisle: String,
    pub location_code: String,
    pub occupied: bool,
    pub sku: Option<SlotSku>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSku {
    pub id: i32,
    pub code: String,
    pub description: Option<String>,
    pub located_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupiedLocation {
    pub rack: String,
    pub level: String,
    pub aisle: String,
    pub location_code: String,
}

impl From<&SlotAssignment> for OccupiedLocation {
    fn from(slot: &SlotAssignment) -> Self {
        Self {
            rack: slot.rack.clone(),
            level: slot.level.clone(),
            aisle: slot.aisle.clone(),
            location_code: slot.location_code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseStatistics {
    pub warehouse_id: i32,
    pub total_occupied_slots: usize,
    pub distinct_racks: usize,
    pub distinct_levels: usize,
    pub distinct_aisles: usize,
    pub racks: Vec<String>,
    pub levels: Vec<String>,
    pub aisles: Vec<String>,
}

impl WarehouseStatistics {
    fn from_slots(warehouse_id: i32, slots: &[SlotAssignment]) -> Self {
        let racks: BTreeSet<&str> = slots.iter().map(|s| s.rack.as_str()).collect();
        let levels: BTreeSet<&str> = slots.iter().map(|s| s.level.as_str()).collect();
        let aisles: BTreeSet<&str> = slots.iter().map(|s| s.aisle.as_str()).collect();

        Self {
            warehouse_id,
            total_occupied_slots: slots.len(),
            distinct_racks: racks.len(),
            distinct_levels: levels.len(),
            distinct_aisles: aisles.len(),
            racks: racks.into_iter().map(String::from).collect(),
            levels: levels.into_iter().map(String::from).collect(),
            aisles: aisles.into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseSummary {
    pub warehouse_id: i32,
    pub warehouse_name: String,
    pub capacity: Option<i32>,
    pub total_slots: usize,
    pub occupied_slots: usize,
    pub free_slots: usize,
    pub occupancy_percentage: u32,
    pub generated_at: DateTime<Utc>,
}

impl WarehouseSummary {
    /// With a known capacity the percentage is occupied/capacity. Without one,
    /// the total is the number of current assignments, so any located SKU
    /// reads as 100%.
    pub fn new(warehouse: &Warehouse, occupied: usize, assignments: usize) -> Self {
        let total_slots = match warehouse.capacity {
            Some(capacity) => usize::try_from(capacity).unwrap_or(0),
            None => assignments,
        };
        Self {
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name.clone(),
            capacity: warehouse.capacity,
            total_slots,
            occupied_slots: occupied,
            free_slots: total_slots.saturating_sub(occupied),
            occupancy_percentage: occupancy_percentage(occupied, total_slots),
            generated_at: Utc::now(),
        }
    }
}

pub fn occupancy_percentage(occupied: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((occupied as f64 / total as f64) * 100.0).round() as u32
}

/// Read-only views over current slot assignments.
#[derive(Clone)]
pub struct OccupancyReport {
    store: Arc<dyn InventoryStore>,
}

impl OccupancyReport {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Only slots that currently hold a SKU are listed; there is no fixed
    /// slot universe to enumerate free ones from.
    pub async fn occupancy_map(&self, warehouse_id: i32) -> GeoResult<Vec<OccupancyEntry>> {
        let mut entries: Vec<OccupancyEntry> = self
            .store
            .find_slot_details(&SlotQuery::warehouse(warehouse_id))
            .await?
            .into_iter()
            .map(|detail| OccupancyEntry {
                rack: detail.rack,
                level: detail.level,
                aisle: detail.aisle,
                location_code: detail.location_code,
                occupied: true,
                sku: Some(SlotSku {
                    id: detail.sku_id,
                    code: detail.sku_code,
                    description: detail.sku_description,
                    located_at: detail.located_at,
                }),
            })
            .collect();
        entries.sort_by(|a, b| a.location_code.cmp(&b.location_code));
        Ok(entries)
    }

    pub async fn statistics(&self, warehouse_id: i32) -> GeoResult<WarehouseStatistics> {
        let slots = self.store.slots_by_warehouse(warehouse_id).await?;
        Ok(WarehouseStatistics::from_slots(warehouse_id, &slots))
    }

    pub async fn summary(&self, warehouse: &Warehouse) -> GeoResult<WarehouseSummary> {
        let slots = self.store.slots_by_warehouse(warehouse.id).await?;
        // Every stored assignment references a SKU, so occupied == assignments
        // unless capacity is configured.
        Ok(WarehouseSummary::new(warehouse, slots.len(), slots.len()))
    }

    pub async fn occupied_locations(&self, warehouse_id: i32) -> GeoResult<Vec<OccupiedLocation>> {
        let mut locations: Vec<OccupiedLocation> = self
            .store
            .slots_by_warehouse(warehouse_id)
            .await?
            .iter()
            .map(OccupiedLocation::from)
            .collect();
        locations.sort_by(|a, b| a.location_code.cmp(&b.location_code));
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::SlotRegistry,
        models::{NewSku, NewWarehouse},
        store::{MemoryStore, SkuRegistry, WarehouseRegistry},
    };

    fn slot(id: i32, rack: &str, level: &str, aisle: &str) -> SlotAssignment {
        SlotAssignment {
            id,
            sku_id: id,
            warehouse_id: 1,
            rack: rack.to_string(),
            level: level.to_string(),
            aisle: aisle.to_string(),
            located_at: None,
        }
    }

    #[test]
    fn statistics_count_distinct_dimensions() {
        let slots = vec![
            slot(1, "A1", "01", "01"),
            slot(2, "A1", "02", "01"),
            slot(3, "B2", "02", "03"),
        ];
        let stats = WarehouseStatistics::from_slots(1, &slots);
        assert_eq!(stats.total_occupied_slots, 3);
        assert_eq!(stats.distinct_racks, 2);
        assert_eq!(stats.distinct_levels, 2);
        assert_eq!(stats.distinct_aisles, 2);
        assert_eq!(stats.racks, vec!["A1", "B2"]);
    }

    #[test]
    fn summary_without_capacity_keeps_assignment_ratio() {
        let warehouse = Warehouse { id: 1, name: "General".to_string(), capacity: None };
        let summary = WarehouseSummary::new(&warehouse, 4, 4);
        assert_eq!(summary.total_slots, 4);
        assert_eq!(summary.free_slots, 0);
        assert_eq!(summary.occupancy_percentage, 100);

        let empty = WarehouseSummary::new(&warehouse, 0, 0);
        assert_eq!(empty.occupancy_percentage, 0);
    }

    #[test]
    fn summary_with_capacity_uses_it() {
        let warehouse = Warehouse { id: 1, name: "General".to_string(), capacity: Some(8) };
        let summary = WarehouseSummary::new(&warehouse, 3, 3);
        assert_eq!(summary.total_slots, 8);
        assert_eq!(summary.free_slots, 5);
        assert_eq!(summary.occupancy_percentage, 38);
    }

    #[tokio::test]
    async fn occupancy_map_lists_every_assigned_slot() {
        let store = Arc::new(MemoryStore::new());
        let warehouse = store
            .create_warehouse(&NewWarehouse::new("Bulk", None))
            .await
            .unwrap();
        let registry = SlotRegistry::new(store.clone());
        for (i, aisle) in ["05", "01", "03"].iter().enumerate() {
            let sku = store
                .create_sku(&NewSku::new(format!("SKU{}", i), Some("Box".to_string()), None))
                .await
                .unwrap();
            registry.assign(sku.id, warehouse.id, "R1", "01", aisle).await.unwrap();
        }

        let report = OccupancyReport::new(store);
        let map = report.occupancy_map(warehouse.id).await.unwrap();
        assert_eq!(map.len(), 3);
        assert!(map.iter().all(|e| e.occupied && e.sku.is_some()));
        let codes: Vec<_> = map.iter().map(|e| e.location_code.as_str()).collect();
        assert_eq!(codes, vec!["R1-01-01", "R1-01-03", "R1-01-05"]);
    }
}
