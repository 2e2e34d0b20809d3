//! Synthetic payout exposure from a risk score and local demographics
//!
//! ```text
//! densityMultiplier = min(density / 1000, cap)
//! baseExposure      = base × densityMultiplier × urbanMultiplier
//! severity          = (risk / 100) ^ exponent
//! percentile_k      = floor(baseExposure × severity × multiplier_k)
//! ```
//!
//! With non-decreasing multipliers the floors can never invert, so
//! `expected <= percentile75 <= percentile90 <= worst_case` always holds.

use serde::{Deserialize, Serialize};

use crate::config::ExposureConfig;
use crate::error::{Result, RiskError};
use crate::grid::UrbanizationClass;

/// Payout percentiles in currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutEstimate {
    pub expected: u64,
    pub percentile75: u64,
    pub percentile90: u64,
    pub worst_case: u64,
}

impl PayoutEstimate {
    /// Values in ascending percentile order
    pub fn as_array(&self) -> [u64; 4] {
        [self.expected, self.percentile75, self.percentile90, self.worst_case]
    }

    pub fn is_monotonic(&self) -> bool {
        self.as_array().windows(2).all(|w| w[0] <= w[1])
    }
}

/// Maps risk scores to [`PayoutEstimate`]s
#[derive(Debug, Clone)]
pub struct ExposureModel {
    config: ExposureConfig,
}

impl ExposureModel {
    pub fn new(config: ExposureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExposureConfig {
        &self.config
    }

    fn urban_multiplier(&self, class: UrbanizationClass) -> f64 {
        match class {
            UrbanizationClass::Urban => self.config.urban_multiplier,
            UrbanizationClass::Suburban => self.config.suburban_multiplier,
            UrbanizationClass::Rural => self.config.rural_multiplier,
        }
    }

    /// Exposure before the risk-severity scaling is applied
    pub fn base_exposure(&self, population_density: u32, class: UrbanizationClass) -> f64 {
        let density_multiplier = (population_density as f64 / 1000.0).min(self.config.density_cap);
        self.config.base_exposure * density_multiplier * self.urban_multiplier(class)
    }

    /// Estimate payouts for a risk score in 0..=100
    pub fn estimate(
        &self,
        risk_score: f64,
        population_density: u32,
        class: UrbanizationClass,
    ) -> Result<PayoutEstimate> {
        if !risk_score.is_finite() || !(0.0..=100.0).contains(&risk_score) {
            return Err(RiskError::InvalidScore(risk_score));
        }

        let severity = (risk_score / 100.0).powf(self.config.severity_exponent);
        let scaled = self.base_exposure(population_density, class) * severity;
        let [expected, p75, p90, worst] = self.config.percentile_multipliers;
        let at = |multiplier: f64| (scaled * multiplier).floor().max(0.0) as u64;

        let estimate = PayoutEstimate {
            expected: at(expected),
            percentile75: at(p75),
            percentile90: at(p90),
            worst_case: at(worst),
        };
        debug_assert!(estimate.is_monotonic());
        Ok(estimate)
    }
}

impl Default for ExposureModel {
    fn default() -> Self {
        Self::new(ExposureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_risk_pays_nothing() {
        let model = ExposureModel::default();
        for class in [UrbanizationClass::Urban, UrbanizationClass::Suburban, UrbanizationClass::Rural] {
            let est = model.estimate(0.0, 2400, class).unwrap();
            assert_eq!(est, PayoutEstimate::default());
        }
    }

    #[test]
    fn test_full_risk_urban_capped_density() {
        // density 4000 caps at 2.5: 1e6 * 2.5 * 1.5 = 3.75e6, severity 1
        let est = ExposureModel::default().estimate(100.0, 4000, UrbanizationClass::Urban).unwrap();
        assert_eq!(est.expected, 2_250_000);
        assert_eq!(est.percentile75, 3_187_500);
        assert_eq!(est.percentile90, 4_312_500);
        assert_eq!(est.worst_case, 6_187_500);
    }

    #[test]
    fn test_half_risk_suburban() {
        let model = ExposureModel::default();
        let est = model.estimate(50.0, 1000, UrbanizationClass::Suburban).unwrap();
        let scaled = 1_200_000.0 * 0.5f64.powf(1.2);
        assert_eq!(est.expected, (scaled * 0.6).floor() as u64);
        assert_eq!(est.worst_case, (scaled * 1.65).floor() as u64);
        assert_relative_eq!(model.base_exposure(1000, UrbanizationClass::Suburban), 1_200_000.0);
    }

    #[test]
    fn test_monotonic_for_all_scores() {
        let model = ExposureModel::default();
        for risk in 0..=100 {
            for density in [0, 1, 799, 800, 1234, 1501, 2500, 9999] {
                for class in [UrbanizationClass::Urban, UrbanizationClass::Suburban, UrbanizationClass::Rural] {
                    let est = model.estimate(risk as f64, density, class).unwrap();
                    assert!(est.is_monotonic(), "risk {risk} density {density}: {est:?}");
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let model = ExposureModel::default();
        assert!(matches!(
            model.estimate(100.5, 1000, UrbanizationClass::Rural),
            Err(RiskError::InvalidScore(_))
        ));
        assert!(model.estimate(f64::NAN, 1000, UrbanizationClass::Rural).is_err());
        assert!(model.estimate(-1.0, 1000, UrbanizationClass::Rural).is_err());
    }
}
