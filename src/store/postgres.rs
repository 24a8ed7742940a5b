use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    database::Database,
    error::{GeoError, GeoResult},
    geolocation::codec::Location,
    models::{NewSku, NewWarehouse, Placement, Sku, SlotAssignment, SlotDetail, Warehouse},
};

use super::{occupied_message, SkuRegistry, SlotQuery, SlotStore, WarehouseRegistry};

const SKU_COLUMNS: &str = "id, code, description, container_id, registered_at";
const SLOT_COLUMNS: &str = "id, sku_id, warehouse_id, rack, level, aisle, located_at";

const DETAIL_SELECT: &str = r#"
    SELECT
        g.id,
        g.sku_id,
        s.code AS sku_code,
        s.description AS sku_description,
        s.container_id,
        s.registered_at,
        g.warehouse_id,
        w.name AS warehouse_name,
        g.rack,
        g.level,
        g.aisle,
        g.located_at
    FROM slot_assignments g
    JOIN skus s ON g.sku_id = s.id
    JOIN warehouses w ON g.warehouse_id = w.id
"#;

/// PostgreSQL-backed store. Uniqueness is enforced by the constraints in
/// `migrations/`; violations come back as `Conflict`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Database,
}

impl PgStore {
    pub fn new(pool: Database) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Database {
        &self.pool
    }
}

/// Translates constraint violations into domain errors.
fn map_write_error(err: sqlx::Error, location: Option<&Location>) -> GeoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match (db_err.constraint(), location) {
                (Some("slot_assignments_location_key"), Some(location)) => {
                    occupied_message(location)
                }
                (Some("slot_assignments_location_key"), None) => {
                    "Location is already occupied".to_string()
                }
                (Some("slot_assignments_sku_key"), _) => {
                    "SKU already has an assigned location".to_string()
                }
                (Some("skus_code_key"), _) => "A SKU with this code already exists".to_string(),
                (Some("warehouses_name_key"), _) => {
                    "A warehouse with this name already exists".to_string()
                }
                _ => "Duplicate record".to_string(),
            };
            return GeoError::Conflict(message);
        }
        if db_err.is_foreign_key_violation() {
            return GeoError::not_found("Referenced SKU or warehouse not found");
        }
    }
    log::error!("Database write failed: {}", err);
    GeoError::from(err)
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl SkuRegistry for PgStore {
    async fn sku_by_id(&self, id: i32) -> GeoResult<Option<Sku>> {
        let sku =
            sqlx::query_as::<_, Sku>(&format!("SELECT {SKU_COLUMNS} FROM skus WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(sku)
    }

    async fn sku_by_code(&self, code: &str) -> GeoResult<Option<Sku>> {
        let sku =
            sqlx::query_as::<_, Sku>(&format!("SELECT {SKU_COLUMNS} FROM skus WHERE code = $1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(sku)
    }

    async fn sku_code_exists(&self, code: &str) -> GeoResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM skus WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_sku(&self, new_sku: &NewSku) -> GeoResult<Sku> {
        sqlx::query_as::<_, Sku>(&format!(
            r#"
            INSERT INTO skus (code, description, container_id)
            VALUES ($1, $2, $3)
            RETURNING {SKU_COLUMNS}
            "#
        ))
        .bind(&new_sku.code)
        .bind(&new_sku.description)
        .bind(new_sku.container_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, None))
    }

    async fn all_skus(&self) -> GeoResult<Vec<Sku>> {
        let skus = sqlx::query_as::<_, Sku>(&format!("SELECT {SKU_COLUMNS} FROM skus ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(skus)
    }

    async fn search_skus_by_description(&self, term: &str) -> GeoResult<Vec<Sku>> {
        let skus = sqlx::query_as::<_, Sku>(&format!(
            "SELECT {SKU_COLUMNS} FROM skus WHERE description ILIKE $1 ORDER BY id"
        ))
        .bind(like_pattern(term))
        .fetch_all(&self.pool)
        .await?;
        Ok(skus)
    }
}

#[async_trait]
impl WarehouseRegistry for PgStore {
    async fn warehouse_by_id(&self, id: i32) -> GeoResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            "SELECT id, name, capacity FROM warehouses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(warehouse)
    }

    async fn warehouses(&self) -> GeoResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT id, name, capacity FROM warehouses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(warehouses)
    }

    async fn warehouse_name_exists(&self, name: &str) -> GeoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM warehouses WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_warehouse(&self, new_warehouse: &NewWarehouse) -> GeoResult<Warehouse> {
        sqlx::query_as::<_, Warehouse>(
            "INSERT INTO warehouses (name, capacity) VALUES ($1, $2) RETURNING id, name, capacity",
        )
        .bind(&new_warehouse.name)
        .bind(new_warehouse.capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, None))
    }
}

#[async_trait]
impl SlotStore for PgStore {
    async fn slots_by_warehouse(&self, warehouse_id: i32) -> GeoResult<Vec<SlotAssignment>> {
        let slots = sqlx::query_as::<_, SlotAssignment>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slot_assignments WHERE warehouse_id = $1 ORDER BY id"
        ))
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }

    async fn slot_by_sku(&self, sku_id: i32) -> GeoResult<Option<SlotAssignment>> {
        let slot = sqlx::query_as::<_, SlotAssignment>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slot_assignments WHERE sku_id = $1"
        ))
        .bind(sku_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(slot)
    }

    async fn slot_at(
        &self,
        warehouse_id: i32,
        location: &Location,
    ) -> GeoResult<Option<SlotAssignment>> {
        let slot = sqlx::query_as::<_, SlotAssignment>(&format!(
            r#"
            SELECT {SLOT_COLUMNS} FROM slot_assignments
            WHERE warehouse_id = $1 AND rack = $2 AND level = $3 AND aisle = $4
            "#
        ))
        .bind(warehouse_id)
        .bind(location.rack.as_str())
        .bind(location.level.as_str())
        .bind(location.aisle.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(slot)
    }

    async fn insert_slot(&self, sku_id: i32, placement: &Placement) -> GeoResult<SlotAssignment> {
        sqlx::query_as::<_, SlotAssignment>(&format!(
            r#"
            INSERT INTO slot_assignments (sku_id, warehouse_id, rack, level, aisle, located_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ON CONSTRAINT slot_assignments_sku_key DO UPDATE
            SET warehouse_id = EXCLUDED.warehouse_id,
                rack = EXCLUDED.rack,
                level = EXCLUDED.level,
                aisle = EXCLUDED.aisle,
                located_at = EXCLUDED.located_at
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(sku_id)
        .bind(placement.warehouse_id)
        .bind(placement.location.rack.as_str())
        .bind(placement.location.level.as_str())
        .bind(placement.location.aisle.as_str())
        .bind(placement.located_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(&placement.location)))
    }

    async fn update_slot(&self, slot_id: i32, placement: &Placement) -> GeoResult<SlotAssignment> {
        sqlx::query_as::<_, SlotAssignment>(&format!(
            r#"
            UPDATE slot_assignments
            SET warehouse_id = $1, rack = $2, level = $3, aisle = $4, located_at = $5
            WHERE id = $6
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(placement.warehouse_id)
        .bind(placement.location.rack.as_str())
        .bind(placement.location.level.as_str())
        .bind(placement.location.aisle.as_str())
        .bind(placement.located_at)
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(&placement.location)))?
        .ok_or_else(|| GeoError::not_found(format!("Slot assignment {} not found", slot_id)))
    }

    async fn delete_slot_for_sku(&self, sku_id: i32) -> GeoResult<bool> {
        let result = sqlx::query("DELETE FROM slot_assignments WHERE sku_id = $1")
            .bind(sku_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_slot_details(&self, query: &SlotQuery) -> GeoResult<Vec<SlotDetail>> {
        let mut builder = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        let mut separator = " WHERE ";

        if let Some(warehouse_id) = query.warehouse_id {
            builder.push(separator).push("g.warehouse_id = ").push_bind(warehouse_id);
            separator = " AND ";
        }
        if let Some(rack) = &query.rack {
            builder.push(separator).push("g.rack = ").push_bind(rack.clone());
            separator = " AND ";
        }
        if let Some(aisle) = &query.aisle {
            builder.push(separator).push("g.aisle = ").push_bind(aisle.clone());
            separator = " AND ";
        }
        if let Some(term) = &query.rack_fragment {
            builder.push(separator).push("g.rack ILIKE ").push_bind(like_pattern(term));
        }
        builder.push(" ORDER BY g.id");

        let details = builder
            .build_query_as::<SlotDetail>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(SlotDetail::with_location_code)
            .collect();
        Ok(details)
    }

    async fn create_sku_with_slot(
        &self,
        new_sku: &NewSku,
        placement: &Placement,
    ) -> GeoResult<(Sku, SlotAssignment)> {
        let mut tx = self.pool.begin().await?;

        let sku = sqlx::query_as::<_, Sku>(&format!(
            r#"
            INSERT INTO skus (code, description, container_id)
            VALUES ($1, $2, $3)
            RETURNING {SKU_COLUMNS}
            "#
        ))
        .bind(&new_sku.code)
        .bind(&new_sku.description)
        .bind(new_sku.container_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, None))?;

        let slot = sqlx::query_as::<_, SlotAssignment>(&format!(
            r#"
            INSERT INTO slot_assignments (sku_id, warehouse_id, rack, level, aisle, located_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(sku.id)
        .bind(placement.warehouse_id)
        .bind(placement.location.rack.as_str())
        .bind(placement.location.level.as_str())
        .bind(placement.location.aisle.as_str())
        .bind(placement.located_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, Some(&placement.location)))?;

        // Dropping `tx` on the error paths above rolls the SKU insert back.
        tx.commit().await?;
        Ok((sku, slot))
    }
}
