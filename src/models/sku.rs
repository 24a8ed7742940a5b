use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{GeoError, GeoResult};
use super::SlotAssignment;

pub const MIN_CODE_LEN: usize = 2;
pub const MAX_CODE_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sku {
    pub id: i32,
    pub code: String,
    pub description: Option<String>,
    pub container_id: Option<i32>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSku {
    pub code: String,
    pub description: Option<String>,
    pub container_id: Option<i32>,
}

impl NewSku {
    pub fn new(
        code: impl Into<String>,
        description: Option<String>,
        container_id: Option<i32>,
    ) -> Self {
        Self {
            code: code.into().trim().to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            container_id,
        }
    }

    /// SKU codes are scanned from labels: letters, digits, `-` and `_` only.
    pub fn validate(&self) -> GeoResult<()> {
        let len = self.code.chars().count();
        if len < MIN_CODE_LEN || len > MAX_CODE_LEN {
            return Err(GeoError::validation(format!(
                "SKU code must be between {} and {} characters",
                MIN_CODE_LEN, MAX_CODE_LEN
            )));
        }
        if !self
            .code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(GeoError::validation(
                "SKU code may only contain letters, digits, '-' and '_'",
            ));
        }
        Ok(())
    }
}

/// A SKU together with its current slot, if any.
#[derive(Debug, Clone, Serialize)]
pub struct SkuWithLocation {
    #[serde(flatten)]
    pub sku: Sku,
    pub located: bool,
    pub assignment: Option<SlotAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuStatistics {
    pub total: usize,
    pub located: usize,
    pub unlocated: usize,
    pub located_percentage: u32,
}

impl SkuStatistics {
    pub fn new(total: usize, located: usize) -> Self {
        let located_percentage = if total > 0 {
            ((located as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };
        Self {
            total,
            located,
            unlocated: total.saturating_sub(located),
            located_percentage,
        }
    }
}
