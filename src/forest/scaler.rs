use ndarray::{Array1, Array2, Axis};

use crate::error::{AnomalyError, Result};

/// Per-column standardization to zero mean and unit variance.
///
/// Uses the population standard deviation. A constant column keeps a scale
/// of one so it maps to zeros instead of NaN.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| AnomalyError::ModelFit("cannot standardize an empty matrix".into()))?;
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        (data - &self.mean) / &self.scale
    }

    pub fn fit_transform(data: &Array2<f64>) -> Result<Array2<f64>> {
        let scaler = Self::fit(data)?;
        Ok(scaler.transform(data))
    }
}
