//! Error types shared by the scoring, grid and raster engines

use thiserror::Error;

/// Boxed cause carried by upstream failures
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised anywhere in the engine
#[derive(Debug, Error)]
pub enum RiskError {
    /// Latitude or longitude outside the valid range (or not a number)
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// A required weather or raster value was missing or non-finite
    #[error("incomplete input data: {field}")]
    DataIncomplete { field: String },

    /// Pre/post rasters (or bands of one scene) have different shapes
    #[error("raster dimension mismatch: {expected_rows}x{expected_cols} vs {actual_rows}x{actual_cols}")]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// Network or HTTP failure talking to an upstream service
    #[error("upstream fetch from {service} failed: {source}")]
    UpstreamFetch {
        service: &'static str,
        #[source]
        source: BoxedCause,
    },

    /// Risk score outside 0..=100
    #[error("risk score {0} is outside 0..=100")]
    InvalidScore(f64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Background analysis task panicked or was cancelled
    #[error("analysis task failed: {0}")]
    Task(String),
}

impl RiskError {
    pub(crate) fn incomplete(field: impl Into<String>) -> Self {
        RiskError::DataIncomplete { field: field.into() }
    }

    pub(crate) fn upstream(service: &'static str, source: impl Into<BoxedCause>) -> Self {
        RiskError::UpstreamFetch {
            service,
            source: source.into(),
        }
    }

    /// Whether the error stems from bad caller input rather than a failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RiskError::InvalidCoordinate { .. } | RiskError::InvalidScore(_)
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_keeps_source() {
        let err = RiskError::upstream("open-meteo", "connection reset");
        assert!(matches!(err, RiskError::UpstreamFetch { service: "open-meteo", .. }));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_errors() {
        assert!(RiskError::InvalidScore(120.0).is_client_error());
        assert!(!RiskError::incomplete("daily.precipitation_sum").is_client_error());
    }
}
