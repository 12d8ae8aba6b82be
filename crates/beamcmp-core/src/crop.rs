//! Zero and outlier removal on a single source table.
//!
//! Every value column is visited in turn. Rows holding an exact zero are
//! always dropped; with a non-zero magnitude, rows above a threshold derived
//! from the surviving values of that column are dropped too:
//!
//! - `median`: median × magnitude
//! - `mean`: mean × magnitude
//! - `percentile`: the magnitude-th percentile (linear interpolation between
//!   closest ranks), with the level required to be below 100
//!
//! Real columns are compared by value, complex columns by modulus.

use rayon::prelude::*;
use tracing::debug;

use crate::config::{CropBasis, CropConfig, CropKind, IndependentVariable};
use crate::error::{BeamError, BeamResult};
use crate::table::SampleTable;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// `q`-th percentile (0..=100) with linear interpolation between ranks.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Threshold above which rows are dropped.
pub fn crop_threshold(values: &[f64], kind: CropKind, magnitude: f64) -> BeamResult<Option<f64>> {
    let magnitude = magnitude.abs();
    let threshold = match kind {
        CropKind::Median => median(values).map(|m| m * magnitude),
        CropKind::Mean => mean(values).map(|m| m * magnitude),
        CropKind::Percentile => {
            if magnitude >= 100.0 {
                return Err(BeamError::config(
                    "crop.magnitude",
                    magnitude,
                    "percentile crops require a level below 100",
                ));
            }
            percentile(values, magnitude)
        }
    };
    Ok(threshold)
}

fn crop_partition(mut table: SampleTable, kind: CropKind, magnitude: f64) -> BeamResult<SampleTable> {
    for name in table.value_column_names() {
        let column = table.require(&name)?;
        let before = table.height();
        let nonzero = table.filter(|i| !column.is_zero(i));
        table = nonzero;
        let zeros = before - table.height();

        let mut outliers = 0;
        if magnitude != 0.0 && !table.is_empty() {
            let column = table.require(&name)?;
            let values = column.plottable();
            if let Some(threshold) = crop_threshold(&values, kind, magnitude)? {
                let kept = table.filter(|i| !(values[i] > threshold));
                outliers = table.height() - kept.height();
                table = kept;
            }
        }
        if zeros + outliers > 0 {
            debug!(column = %name, zeros, outliers, "cropped rows");
        }
    }
    Ok(table)
}

/// Removes zero and outlying rows according to `config`.
pub fn crop(table: &SampleTable, config: &CropConfig) -> BeamResult<SampleTable> {
    config.validate()?;
    let magnitude = config.magnitude();
    match config.basis {
        CropBasis::None => Ok(table.clone()),
        CropBasis::Overall => crop_partition(table.clone(), config.kind, magnitude),
        CropBasis::PerFrequency => {
            let partitions = table.partition(IndependentVariable::Freq);
            if partitions.is_empty() {
                return Ok(table.clone());
            }
            let parts = partitions
                .par_iter()
                .map(|p| crop_partition(table.take(&p.rows), config.kind, magnitude))
                .collect::<BeamResult<Vec<_>>>()?;
            SampleTable::vstack(parts)
        }
    }
}
