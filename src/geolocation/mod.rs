pub mod codec;
pub mod registry;
pub mod reporting;
pub mod service;

pub use codec::{Label, Location};
pub use registry::SlotRegistry;
pub use reporting::{
    OccupancyEntry, OccupancyReport, OccupiedLocation, WarehouseStatistics, WarehouseSummary,
};
pub use service::{
    GeolocationService, LocatedSkuFilter, LocationCheck, LocationFilter, LocationRequest,
    NewSkuWithLocation, SkuLookup, SkuWithAssignment,
};
