//! Synthetic SAR and multispectral scenes
//!
//! Used when no catalog imagery is available, and to fill scenes whose
//! acquisition metadata came from the catalog. Values follow typical
//! ranges: backscatter around -15..-5 dB, reflectance in 0..1.

use rand::Rng;

use super::{MultispectralScene, RasterGrid};
use crate::error::Result;

/// Share of cells inundated in a simulated post-event SAR scene
pub const SAR_FLOOD_FRACTION: f64 = 0.2;
/// Backscatter drop applied to inundated cells
pub const SAR_FLOOD_DROP_DB: f64 = 8.0;
/// Attenuation applied to both bands of a cloud-covered cell
pub const CLOUD_ATTENUATION: f64 = 0.7;

/// Burn probability and cloud cover for one simulated acquisition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneProfile {
    /// Chance that a cell shows a burn-scar signature
    pub burn_probability: f64,
    /// Cloud cover in percent; `None` leaves the scene cloud free
    pub cloud_cover_pct: Option<f64>,
}

impl SceneProfile {
    /// Unburned vegetation with no clouds
    pub const HEALTHY: SceneProfile = SceneProfile { burn_probability: 0.0, cloud_cover_pct: None };
    /// Fire-affected area with no clouds
    pub const BURNED: SceneProfile = SceneProfile { burn_probability: 0.3, cloud_cover_pct: None };
}

/// Pre/post backscatter pair in dB for a `size × size` area.
///
/// Per cell: pre = -15 + U·10; with probability 0.2 post = pre - 8, else
/// post = pre + U·2 - 1.
pub fn simulate_sar_pair<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<(RasterGrid, RasterGrid)> {
    let mut pre = Vec::with_capacity(size * size);
    let mut post = Vec::with_capacity(size * size);
    for _ in 0..size * size {
        let base = -15.0 + rng.gen::<f64>() * 10.0;
        pre.push(base);
        let flooded = rng.gen::<f64>() < SAR_FLOOD_FRACTION;
        post.push(if flooded {
            base - SAR_FLOOD_DROP_DB
        } else {
            base + rng.gen::<f64>() * 2.0 - 1.0
        });
    }
    Ok((RasterGrid::new(size, size, pre)?, RasterGrid::new(size, size, post)?))
}

/// NIR/SWIR scene for a `size × size` area
pub fn simulate_multispectral<R: Rng + ?Sized>(
    size: usize,
    profile: SceneProfile,
    rng: &mut R,
) -> Result<MultispectralScene> {
    let mut nir = Vec::with_capacity(size * size);
    let mut swir = Vec::with_capacity(size * size);
    for _ in 0..size * size {
        let (mut n, mut s) = if rng.gen::<f64>() < profile.burn_probability {
            // Burn scar: low NIR, high SWIR
            (0.1 + rng.gen::<f64>() * 0.2, 0.3 + rng.gen::<f64>() * 0.2)
        } else {
            (0.4 + rng.gen::<f64>() * 0.3, 0.1 + rng.gen::<f64>() * 0.15)
        };
        if let Some(cloud) = profile.cloud_cover_pct {
            if rng.gen::<f64>() * 100.0 < cloud {
                n *= CLOUD_ATTENUATION;
                s *= CLOUD_ATTENUATION;
            }
        }
        nir.push(n);
        swir.push(s);
    }
    MultispectralScene::new(RasterGrid::new(size, size, nir)?, RasterGrid::new(size, size, swir)?)
}
