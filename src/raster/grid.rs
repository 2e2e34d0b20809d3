use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Dense row-major matrix of finite cell values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl RasterGrid {
    /// Grid from a flat row-major buffer
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(RiskError::DimensionMismatch {
                expected_rows: rows,
                expected_cols: cols,
                actual_rows: values.len() / cols.max(1),
                actual_cols: cols,
            });
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(RiskError::incomplete(format!("raster[{}][{}]", i / cols.max(1), i % cols.max(1))));
        }
        Ok(Self { rows, cols, values })
    }

    /// Grid from nested rows; ragged input is a dimension mismatch
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(RiskError::DimensionMismatch {
                expected_rows: height,
                expected_cols: width,
                actual_rows: height,
                actual_cols: bad.len(),
            });
        }
        Self::new(height, width, rows.into_iter().flatten().collect())
    }

    /// Grid of `rows × cols` cells filled by `f(row, col)`
    pub fn from_fn<F: FnMut(usize, usize) -> f64>(rows: usize, cols: usize, mut f: F) -> Result<Self> {
        let mut values = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                values.push(f(r, c));
            }
        }
        Self::new(rows, cols, values)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.values.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Cells as nested rows, the layout used by the JSON artifacts
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.values.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    /// Fail unless `other` has exactly this grid's shape
    pub fn ensure_same_shape(&self, other: &RasterGrid) -> Result<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(RiskError::DimensionMismatch {
                expected_rows: self.rows,
                expected_cols: self.cols,
                actual_rows: other.rows,
                actual_cols: other.cols,
            });
        }
        Ok(())
    }

    /// Cell-wise combination of two equally shaped grids
    pub fn zip_map<F: Fn(f64, f64) -> f64>(&self, other: &RasterGrid, f: F) -> Result<RasterGrid> {
        self.ensure_same_shape(other)?;
        let values = self.values.iter().zip(&other.values).map(|(&a, &b)| f(a, b)).collect();
        RasterGrid::new(self.rows, self.cols, values)
    }
}
