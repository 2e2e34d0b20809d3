//! Write-only persistence for analysis records, artifacts and indicator points

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::satellite::IndicatorPoint;

/// One completed raster analysis, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeospatialAnalysisRecord {
    pub analysis_type: String,
    pub location_name: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub bbox_north: f64,
    pub bbox_south: f64,
    pub bbox_east: f64,
    pub bbox_west: f64,
    pub acquisition_date_pre: String,
    pub acquisition_date_post: String,
    pub satellite_source: String,
    pub analysis_results: serde_json::Value,
    pub geotiff_url: String,
    pub shapefile_url: String,
    pub processing_status: String,
}

/// Destination for everything an ingestion run produces.
///
/// Implementations must tolerate concurrent calls from worker threads.
pub trait AnalysisSink: Send + Sync {
    /// Store an artifact and return where it can be retrieved from
    fn store_artifact(&self, name: &str, content_type: &str, bytes: &[u8]) -> Result<String>;

    fn insert_analysis(&self, record: &GeospatialAnalysisRecord) -> Result<()>;

    fn insert_indicators(&self, points: &[IndicatorPoint]) -> Result<()>;
}

/// Sink writing under a directory:
/// `artifacts/<name>`, `geospatial_analysis.jsonl`, `satellite_data.jsonl`
#[derive(Debug)]
pub struct FileSink {
    root: PathBuf,
    // Serializes appends to the JSON-lines files
    append_lock: Mutex<()>,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("artifacts"))?;
        Ok(Self {
            root,
            append_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn append_lines<T: Serialize>(&self, file: &str, items: &[T]) -> Result<()> {
        let _guard = self.append_lock.lock().map_err(|_| poisoned())?;
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(file))?;
        for item in items {
            serde_json::to_writer(&mut out, item)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn poisoned() -> RiskError {
    RiskError::Storage(io::Error::other("sink lock poisoned"))
}

impl AnalysisSink for FileSink {
    fn store_artifact(&self, name: &str, content_type: &str, bytes: &[u8]) -> Result<String> {
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(RiskError::Storage(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact name must be a plain file name: {name}"),
            )));
        }
        let path = self.root.join("artifacts").join(name);
        fs::write(&path, bytes)?;
        debug!("stored {} ({content_type}, {} bytes)", path.display(), bytes.len());
        Ok(path.display().to_string())
    }

    fn insert_analysis(&self, record: &GeospatialAnalysisRecord) -> Result<()> {
        self.append_lines("geospatial_analysis.jsonl", std::slice::from_ref(record))
    }

    fn insert_indicators(&self, points: &[IndicatorPoint]) -> Result<()> {
        self.append_lines("satellite_data.jsonl", points)
    }
}

/// In-memory sink, used by tests and the Lambda handler
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<BTreeMap<String, (String, Vec<u8>)>>,
    analyses: Mutex<Vec<GeospatialAnalysisRecord>>,
    indicators: Mutex<Vec<IndicatorPoint>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyses(&self) -> Vec<GeospatialAnalysisRecord> {
        self.analyses.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn indicators(&self) -> Vec<IndicatorPoint> {
        self.indicators.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Content type and bytes of a stored artifact
    pub fn artifact(&self, name: &str) -> Option<(String, Vec<u8>)> {
        self.artifacts.lock().ok()?.get(name).cloned()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl AnalysisSink for MemorySink {
    fn store_artifact(&self, name: &str, content_type: &str, bytes: &[u8]) -> Result<String> {
        self.artifacts
            .lock()
            .map_err(|_| poisoned())?
            .insert(name.to_string(), (content_type.to_string(), bytes.to_vec()));
        Ok(format!("memory://geospatial-products/{name}"))
    }

    fn insert_analysis(&self, record: &GeospatialAnalysisRecord) -> Result<()> {
        self.analyses.lock().map_err(|_| poisoned())?.push(record.clone());
        Ok(())
    }

    fn insert_indicators(&self, points: &[IndicatorPoint]) -> Result<()> {
        self.indicators.lock().map_err(|_| poisoned())?.extend_from_slice(points);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    fn record() -> GeospatialAnalysisRecord {
        GeospatialAnalysisRecord {
            analysis_type: "sar_change_detection".to_string(),
            location_name: "Houston, TX".to_string(),
            center_latitude: 29.7604,
            center_longitude: -95.3698,
            bbox_north: 29.8104,
            bbox_south: 29.7104,
            bbox_east: -95.3198,
            bbox_west: -95.4198,
            acquisition_date_pre: "2026-09-17T00:00:00Z".to_string(),
            acquisition_date_post: "2026-10-17T00:00:00Z".to_string(),
            satellite_source: "simulated".to_string(),
            analysis_results: serde_json::json!({ "changePercentage": 19.8 }),
            geotiff_url: "a.json".to_string(),
            shapefile_url: "a.geojson".to_string(),
            processing_status: "completed".to_string(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("georisk-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        let url = sink.store_artifact("x.json", "application/json", b"{}").unwrap();
        assert!(url.ends_with("x.json"));
        sink.insert_analysis(&record()).unwrap();
        assert_eq!(sink.analyses().len(), 1);
        assert_eq!(sink.artifact("x.json").unwrap().1, b"{}".to_vec());
    }

    #[test]
    fn test_file_sink_appends_json_lines() {
        let dir = scratch_dir("file-sink");
        let sink = FileSink::new(&dir).unwrap();
        sink.insert_analysis(&record()).unwrap();
        sink.insert_analysis(&record()).unwrap();
        let location = sink.store_artifact("grid.json", "application/json", b"[1,2]").unwrap();
        assert_eq!(fs::read(&location).unwrap(), b"[1,2]");

        let file = fs::File::open(dir.join("geospatial_analysis.jsonl")).unwrap();
        let lines: Vec<String> = io::BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        let parsed: GeospatialAnalysisRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed, record());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_sink_rejects_path_names() {
        let dir = scratch_dir("names");
        let sink = FileSink::new(&dir).unwrap();
        assert!(sink.store_artifact("../escape.json", "application/json", b"").is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
