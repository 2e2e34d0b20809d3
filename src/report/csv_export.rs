//! Flat `Metric,Value` CSV export for one analysed location
//!
//! Numbers are written with Rust's shortest round-trip formatting, so
//! parsing the file back yields exactly the values that were written.

use std::collections::HashMap;
use std::io::{Read, Write};

use super::LocationReport;
use crate::error::{Result, RiskError};
use crate::exposure::PayoutEstimate;
use crate::hazard::HazardScores;

const LATITUDE: &str = "Latitude";
const LONGITUDE: &str = "Longitude";
const COMPOSITE: &str = "Composite Risk Score";
const FLOOD: &str = "Flood Risk (%)";
const WILDFIRE: &str = "Wildfire Risk (%)";
const STORM: &str = "Storm Risk (%)";
const DROUGHT: &str = "Drought Risk (%)";
const EXPECTED: &str = "Expected Payout ($)";
const P75: &str = "Payout 75th Percentile ($)";
const P90: &str = "Payout 90th Percentile ($)";
const WORST: &str = "Worst-Case Exposure ($)";

/// Write the report as `Metric,Value` rows
pub fn write_csv<W: Write>(report: &LocationReport, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["Metric", "Value"])?;

    let s = &report.scores;
    let p = &report.payout;
    let rows: [(&str, String); 11] = [
        (LATITUDE, report.latitude.to_string()),
        (LONGITUDE, report.longitude.to_string()),
        (COMPOSITE, s.overall.to_string()),
        (FLOOD, s.flood.to_string()),
        (WILDFIRE, s.wildfire.to_string()),
        (STORM, s.storm.to_string()),
        (DROUGHT, s.drought.to_string()),
        (EXPECTED, p.expected.to_string()),
        (P75, p.percentile75.to_string()),
        (P90, p.percentile90.to_string()),
        (WORST, p.worst_case.to_string()),
    ];
    for (metric, value) in &rows {
        out.write_record([*metric, value.as_str()])?;
    }
    out.flush()?;
    Ok(())
}

/// Report rendered to a string
pub fn to_csv_string(report: &LocationReport) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(report, &mut buf)?;
    String::from_utf8(buf).map_err(|e| RiskError::Config(format!("report is not UTF-8: {e}")))
}

fn field<T: std::str::FromStr>(values: &HashMap<String, String>, metric: &str) -> Result<T> {
    values
        .get(metric)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| RiskError::incomplete(metric))
}

/// Parse a report written by [`write_csv`]
pub fn read_csv<R: Read>(reader: R) -> Result<LocationReport> {
    let mut input = csv::Reader::from_reader(reader);
    let mut values = HashMap::new();
    for result in input.records() {
        let record = result?;
        if let (Some(metric), Some(value)) = (record.get(0), record.get(1)) {
            values.insert(metric.to_string(), value.to_string());
        }
    }

    Ok(LocationReport {
        latitude: field(&values, LATITUDE)?,
        longitude: field(&values, LONGITUDE)?,
        scores: HazardScores {
            flood: field(&values, FLOOD)?,
            wildfire: field(&values, WILDFIRE)?,
            storm: field(&values, STORM)?,
            drought: field(&values, DROUGHT)?,
            overall: field(&values, COMPOSITE)?,
        },
        payout: PayoutEstimate {
            expected: field(&values, EXPECTED)?,
            percentile75: field(&values, P75)?,
            percentile90: field(&values, P90)?,
            worst_case: field(&values, WORST)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> LocationReport {
        LocationReport {
            latitude: 29.7604,
            longitude: -95.3698,
            scores: HazardScores::from_factors(45, 20, 89, 49),
            payout: PayoutEstimate {
                expected: 1_234_567,
                percentile75: 1_748_970,
                percentile90: 2_366_253,
                worst_case: 3_395_059,
            },
        }
    }

    #[test]
    fn test_layout() {
        let text = to_csv_string(&report()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Metric,Value");
        assert_eq!(lines[1], "Latitude,29.7604");
        assert_eq!(lines[3], "Composite Risk Score,51");
        assert_eq!(lines[11], "Worst-Case Exposure ($),3395059");
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn test_read_back_is_exact() {
        let original = LocationReport {
            latitude: 0.1 + 0.2,
            longitude: -179.99999999999997,
            ..report()
        };
        let text = to_csv_string(&original).unwrap();
        let parsed = read_csv(text.as_bytes()).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.latitude.to_bits(), original.latitude.to_bits());
    }

    #[test]
    fn test_missing_metric() {
        let text = "Metric,Value\nLatitude,1.5\n";
        assert!(matches!(read_csv(text.as_bytes()), Err(RiskError::DataIncomplete { .. })));
    }
}
