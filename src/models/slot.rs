use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::geolocation::codec::{self, Location};

/// The row binding one SKU to one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SlotAssignment {
    pub id: i32,
    pub sku_id: i32,
    pub warehouse_id: i32,
    pub rack: String,
    pub level: String,
    pub aisle: String,
    pub located_at: Option<DateTime<Utc>>,
}

impl SlotAssignment {
    pub fn location_code(&self) -> String {
        codec::format(&self.rack, &self.level, &self.aisle)
    }

    pub fn is_at(&self, warehouse_id: i32, location: &Location) -> bool {
        self.warehouse_id == warehouse_id
            && self.rack == location.rack.as_str()
            && self.level == location.level.as_str()
            && self.aisle == location.aisle.as_str()
    }
}

/// Where a SKU should end up: target warehouse, coordinates and timestamp.
#[derive(Debug, Clone)]
pub struct Placement {
    pub warehouse_id: i32,
    pub location: Location,
    pub located_at: DateTime<Utc>,
}

impl Placement {
    pub fn now(warehouse_id: i32, location: Location) -> Self {
        Self {
            warehouse_id,
            location,
            located_at: Utc::now(),
        }
    }
}

/// Slot assignment joined with its SKU and warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SlotDetail {
    pub id: i32,
    pub sku_id: i32,
    pub sku_code: String,
    pub sku_description: Option<String>,
    pub container_id: Option<i32>,
    pub registered_at: DateTime<Utc>,
    pub warehouse_id: i32,
    pub warehouse_name: String,
    pub rack: String,
    pub level: String,
    pub aisle: String,
    pub located_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub location_code: String,
}

impl SlotDetail {
    pub fn with_location_code(mut self) -> Self {
        self.location_code = codec::format(&self.rack, &self.level, &self.aisle);
        self
    }
}
