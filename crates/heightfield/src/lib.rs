pub mod edt;
pub mod grid;
pub mod raster;

pub use edt::distance_field;
pub use grid::{Georef, GridError, Heightfield};
pub use raster::{rasterize_capsule, rasterize_polygon, Mask};
