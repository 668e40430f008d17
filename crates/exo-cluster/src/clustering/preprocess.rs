//! Log compression and per-population standardization
//!
//! Masses, periods, and temperatures span several orders of magnitude, so each
//! column is compressed with `log10(x + ε)` before being z-scored. Mean and
//! standard deviation come from the rows passed in, never from a fixed scale.

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::types::FeatureId;

/// Offset added before taking the logarithm
pub const LOG_EPSILON: f64 = 1e-6;

/// Standard deviation at or below which a column counts as constant
pub const DEGENERATE_STD: f64 = 1e-12;

/// Log-compress and standardize every column of `matrix`
///
/// `features` names the columns, in order, for error reporting. Standard
/// deviation is the population value (ddof = 0).
pub fn transform(matrix: &Array2<f64>, features: &[FeatureId]) -> Result<Array2<f64>> {
    let (rows, cols) = matrix.dim();

    if cols != features.len() {
        return Err(Error::invalid_input(format!(
            "matrix has {} columns but {} features were declared",
            cols,
            features.len()
        )));
    }
    if rows == 0 {
        return Err(Error::invalid_input("cannot standardize an empty matrix"));
    }

    let mut out = matrix.clone();

    for (j, feature) in features.iter().enumerate() {
        let mut column = out.column_mut(j);

        for value in column.iter_mut() {
            let shifted = *value + LOG_EPSILON;
            if !shifted.is_finite() || shifted <= 0.0 {
                return Err(Error::InvalidFeatureValue {
                    feature: *feature,
                    value: *value,
                });
            }
            *value = shifted.log10();
        }

        let mean = column.mean().unwrap_or(0.0);
        let std = column.std(0.0);

        if !std.is_finite() || std <= DEGENERATE_STD {
            return Err(Error::DegeneratePreprocessing { feature: *feature });
        }

        column.mapv_inplace(|v| (v - mean) / std);
    }

    Ok(out)
}
