pub mod sku;
pub mod slot;
pub mod warehouse;

pub use sku::{NewSku, Sku, SkuStatistics, SkuWithLocation};
pub use slot::{Placement, SlotAssignment, SlotDetail};
pub use warehouse::{NewWarehouse, Warehouse};
