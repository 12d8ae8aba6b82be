//! Group-wise peak normalization.

use num_complex::Complex64;
use rayon::prelude::*;
use tracing::debug;

use crate::channel::Channel;
use crate::config::{IndependentVariable, NormMode};
use crate::error::BeamResult;
use crate::table::{Column, SampleTable};

fn row_groups(table: &SampleTable, mode: NormMode) -> Vec<Vec<usize>> {
    let by = match mode {
        NormMode::None => return Vec::new(),
        NormMode::Overall => return vec![(0..table.height()).collect()],
        NormMode::PerFrequency => IndependentVariable::Freq,
        NormMode::PerTime => IndependentVariable::Time,
    };
    table.partition(by).into_iter().map(|p| p.rows).collect()
}

/// Divides `column` by the peak magnitude of each group selected by `mode`.
///
/// A group whose peak is zero maps to zero. Complex values are divided by
/// the peak modulus, keeping their phase.
pub fn normalize_column(table: &mut SampleTable, column: &str, mode: NormMode) -> BeamResult<()> {
    if mode == NormMode::None {
        return Ok(());
    }
    let groups = row_groups(table, mode);
    let values = table.require(column)?;

    let peaks: Vec<f64> = groups
        .par_iter()
        .map(|rows| {
            rows.iter()
                .map(|&i| values.magnitude(i))
                .fold(0.0, f64::max)
        })
        .collect();

    let mut scaled = values.clone();
    for (rows, peak) in groups.iter().zip(peaks) {
        match &mut scaled {
            Column::Real(v) => {
                for &i in rows {
                    v[i] = if peak == 0.0 { 0.0 } else { v[i] / peak };
                }
            }
            Column::Complex(v) => {
                for &i in rows {
                    v[i] = if peak == 0.0 {
                        Complex64::new(0.0, 0.0)
                    } else {
                        v[i] / peak
                    };
                }
            }
        }
    }
    table.insert_column(column, scaled)?;
    debug!(column, %mode, groups = groups.len(), "normalized");
    Ok(())
}

/// Normalizes the linear channels (xx, xy, yy) that the table carries.
pub fn normalize_linear(table: &mut SampleTable, mode: NormMode) -> BeamResult<()> {
    for channel in Channel::LINEAR {
        if table.has_column(channel.name()) {
            normalize_column(table, channel.name(), mode)?;
        }
    }
    Ok(())
}
