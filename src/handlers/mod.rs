pub mod locations;
pub mod skus;
pub mod warehouses;

use axum::response::Json;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::response::ApiResponse;

/// Optional `warehouse_id` query parameter. Empty or malformed values mean
/// "all warehouses", the way HTML filter forms submit them.
#[derive(Debug, Default, Deserialize)]
pub struct WarehouseScope {
    #[serde(default)]
    warehouse_id: String,
}

impl WarehouseScope {
    pub fn warehouse_id(&self) -> Option<i32> {
        parse_id(&self.warehouse_id)
    }
}

pub(crate) fn parse_id(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// Path ids are taken as text so a malformed one still gets a JSON envelope.
pub(crate) fn path_id<T>(value: &str, entity: &str) -> Result<i32, Json<ApiResponse<T>>> {
    parse_id(value).ok_or_else(|| Json(ApiResponse::failure(format!("Invalid {} id", entity))))
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain date used
/// as an upper bound covers the whole day.
pub(crate) fn parse_date_bound(value: Option<&str>, end_of_day: bool) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)?
    } else {
        NaiveTime::MIN
    };
    Some(date.and_time(time).and_utc())
}
