//! Per-sample model/scope differences.

use num_complex::Complex64;
use tracing::warn;

use crate::channel::Channel;
use crate::config::DiffMode;
use crate::error::BeamResult;
use crate::table::{Column, SampleTable};

fn apply<T>(mode: DiffMode, model: T, scope: T) -> T
where
    T: std::ops::Sub<Output = T> + std::ops::Div<Output = T>,
{
    match mode {
        DiffMode::Subtract => model - scope,
        DiffMode::Divide => model / scope,
        DiffMode::InverseDivide => scope / model,
    }
}

/// Writes `<channel>_diff` from the current `<channel>_model` and
/// `<channel>_scope` columns, replacing any previous value.
///
/// Division by zero is not trapped; it yields IEEE infinities or NaN. The
/// count of non-finite results is returned and logged.
pub fn difference(table: &mut SampleTable, channel: Channel, mode: DiffMode) -> BeamResult<usize> {
    let model = table.require(&channel.model_column())?;
    let scope = table.require(&channel.scope_column())?;

    let diff = match (model, scope) {
        (Column::Real(m), Column::Real(s)) => Column::Real(
            m.iter()
                .zip(s)
                .map(|(&m, &s)| apply(mode, m, s))
                .collect(),
        ),
        _ => {
            let m = model.to_complex();
            let s = scope.to_complex();
            Column::Complex(
                m.into_iter()
                    .zip(s)
                    .map(|(m, s)| apply::<Complex64>(mode, m, s))
                    .collect(),
            )
        }
    };

    let non_finite = match &diff {
        Column::Real(v) => v.iter().filter(|x| !x.is_finite()).count(),
        Column::Complex(v) => v.iter().filter(|c| !c.is_finite()).count(),
    };
    if non_finite > 0 {
        warn!(%channel, %mode, non_finite, "difference produced non-finite values");
    }
    table.insert_column(channel.diff_column(), diff)?;
    Ok(non_finite)
}

/// Recomputes the diff column of every channel in `channels`.
pub fn difference_all(table: &mut SampleTable, channels: &[Channel], mode: DiffMode) -> BeamResult<usize> {
    let mut non_finite = 0;
    for &channel in channels {
        non_finite += difference(table, channel, mode)?;
    }
    Ok(non_finite)
}
