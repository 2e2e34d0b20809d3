//! Synthetic demographics derived from position and a uniform random source

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

/// Settlement class inferred from population density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrbanizationClass {
    Urban,
    Suburban,
    Rural,
}

impl UrbanizationClass {
    /// Urban above 1500 people/km², Suburban above 800, otherwise Rural
    pub fn from_density(population_density: u32) -> Self {
        if population_density > 1500 {
            UrbanizationClass::Urban
        } else if population_density > 800 {
            UrbanizationClass::Suburban
        } else {
            UrbanizationClass::Rural
        }
    }

    /// Household income sampling range `[low, high)`
    pub fn income_range(&self) -> (f64, f64) {
        match self {
            UrbanizationClass::Urban => (50_000.0, 120_000.0),
            UrbanizationClass::Suburban => (45_000.0, 105_000.0),
            UrbanizationClass::Rural => (30_000.0, 75_000.0),
        }
    }

    /// Median-age adjustment: cities skew younger
    pub fn age_adjustment(&self) -> f64 {
        match self {
            UrbanizationClass::Urban => -5.0,
            UrbanizationClass::Suburban | UrbanizationClass::Rural => 5.0,
        }
    }
}

/// Demographic estimate for one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    /// People per km²
    pub population_density: u32,
    pub population: u32,
    pub median_age: u32,
    pub household_income: u32,
    #[serde(rename = "urbanization")]
    pub urbanization_class: UrbanizationClass,
}

/// Population density from geographic patterns plus local noise.
/// Draws one uniform value.
pub fn population_density<R: Rng + ?Sized>(coordinate: &Coordinate, rng: &mut R) -> u32 {
    let lat = coordinate.latitude;
    let lng = coordinate.longitude;
    let base = 800.0 + (lat * 5.0).sin().abs() * 1000.0;
    let urban_boost = (lng * 7.0).cos().abs() * 500.0;
    (base + urban_boost + rng.gen::<f64>() * 400.0).floor() as u32
}

/// Estimate demographics for a point. Draws three uniform values in the
/// order density, median age, household income.
pub fn estimate<R: Rng + ?Sized>(coordinate: &Coordinate, rng: &mut R) -> Demographics {
    let population_density = population_density(coordinate, rng);
    let class = UrbanizationClass::from_density(population_density);

    let median_age = (32.0 + rng.gen::<f64>() * 20.0 + class.age_adjustment()).floor() as u32;
    let (low, high) = class.income_range();
    let household_income = (low + rng.gen::<f64>() * (high - low)).floor() as u32;

    Demographics {
        population_density,
        // Density over a ~0.25 km² cell
        population: (population_density as f64 * 0.25).floor() as u32,
        median_age,
        household_income,
        urbanization_class: class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_class_thresholds() {
        assert_eq!(UrbanizationClass::from_density(800), UrbanizationClass::Rural);
        assert_eq!(UrbanizationClass::from_density(801), UrbanizationClass::Suburban);
        assert_eq!(UrbanizationClass::from_density(1500), UrbanizationClass::Suburban);
        assert_eq!(UrbanizationClass::from_density(1501), UrbanizationClass::Urban);
    }

    #[test]
    fn test_zero_draws_at_origin() {
        // sin(0) = 0, cos(0) = 1 and every uniform draw is 0
        let mut rng = StepRng::new(0, 0);
        let origin = Coordinate::new(0.0, 0.0).unwrap();
        let d = estimate(&origin, &mut rng);
        assert_eq!(d.population_density, 1300);
        assert_eq!(d.urbanization_class, UrbanizationClass::Suburban);
        assert_eq!(d.population, 325);
        assert_eq!(d.median_age, 37);
        assert_eq!(d.household_income, 45_000);
    }

    #[test]
    fn test_ranges_hold() {
        let mut rng = seeded_rng(Some(11), 0);
        for i in 0..500 {
            let c = Coordinate::new(-60.0 + i as f64 * 0.23, -170.0 + i as f64 * 0.61).unwrap();
            let d = estimate(&c, &mut rng);
            assert!((800..2700).contains(&d.population_density));
            assert!((27..57).contains(&d.median_age));
            let (low, high) = d.urbanization_class.income_range();
            assert!(d.household_income as f64 >= low && (d.household_income as f64) < high);
            assert_eq!(d.urbanization_class, UrbanizationClass::from_density(d.population_density));
        }
    }
}
