pub mod azimuth;
pub mod config;
pub mod coverage;
pub mod route;
pub mod shadow_geometry;
pub mod sun_position;
pub mod types;

pub use azimuth::{compute_azimuth, normalize_degrees, offset_point, perpendicular_bearing};
pub use config::{EngineConfig, Scenario, DEFAULT_PATH_WIDTH_METERS};
pub use coverage::{
    best_sample, compute_coverage, compute_coverage_parallel, is_shadow_on_path, ShadowEngine,
};
pub use route::{discover_structures, records_on_side, StructureInfo, StructureSource};
pub use shadow_geometry::{compute_shadow_length, shadow_azimuth, shadow_tip};
pub use sun_position::{compute_solar_position, solar_position_at, SunCalculator};
pub use types::{
    CoverageResult, CoverageSample, GeoPoint, PathSide, ShadowError, ShadowLength, SolarPosition,
    StructureRecord, TimeContext,
};
