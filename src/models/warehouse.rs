use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{GeoError, GeoResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Warehouse {
    pub id: i32,
    pub name: String,
    /// Physical slot count, when known. Without it occupancy falls back to
    /// comparing against current assignments.
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub name: String,
    pub capacity: Option<i32>,
}

impl NewWarehouse {
    pub fn new(name: impl Into<String>, capacity: Option<i32>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            capacity,
        }
    }

    pub fn validate(&self) -> GeoResult<()> {
        if self.name.is_empty() || self.name.chars().count() > 100 {
            return Err(GeoError::validation(
                "Warehouse name must be between 1 and 100 characters",
            ));
        }
        if matches!(self.capacity, Some(c) if c <= 0) {
            return Err(GeoError::validation("Warehouse capacity must be positive"));
        }
        Ok(())
    }
}
