//! Load named locations from a CSV file (`Name,Latitude,Longitude`)

use csv::Reader;
use std::path::Path;

use super::{Coordinate, NamedLocation};
use crate::error::Result;

/// Default locations file for batch runs
pub const DEFAULT_LOCATIONS_PATH: &str = "data/locations.csv";

/// Raw CSV row matching the locations file columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

impl CsvRow {
    fn into_location(self) -> Result<NamedLocation> {
        let coordinate = Coordinate::new(self.latitude, self.longitude)?;
        Ok(NamedLocation::new(self.name.trim(), coordinate))
    }
}

/// Load all locations from a CSV file
pub fn load_locations<P: AsRef<Path>>(path: P) -> Result<Vec<NamedLocation>> {
    let reader = Reader::from_path(path)?;
    collect_rows(reader)
}

/// Load locations from any reader (string buffer, request body, ...)
pub fn load_locations_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<NamedLocation>> {
    collect_rows(Reader::from_reader(reader))
}

fn collect_rows<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<NamedLocation>> {
    let mut locations = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        locations.push(row.into_location()?);
    }
    Ok(locations)
}
