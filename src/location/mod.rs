//! Coordinates, named locations and location-list loading

mod data;
pub mod loader;

pub use data::{default_locations, BoundingBox, Coordinate, NamedLocation, KM_PER_DEGREE};
pub use loader::{load_locations, load_locations_from_reader};
