//! Figures of merit: RMSE of the diff column and Pearson correlation
//! between model and scope, per group of an independent variable.
//!
//! Complex channels enter both statistics by modulus; correlating complex
//! series is undefined, so `xy` is correlated on |xy_model| vs |xy_scope|.
//!
//! A group with fewer than two samples has no correlation. It still gets
//! its RMSE, and a [`BeamError::InsufficientData`] is recorded for it in
//! [`FomSeries::failures`]; the remaining groups are unaffected.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::config::IndependentVariable;
use crate::error::{BeamError, BeamResult};
use crate::table::{GroupKey, SampleTable};

/// Root-mean-square of `values`; NaN for an empty slice.
pub fn rmse(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Pearson product-moment correlation. `None` below two samples; NaN when
/// either series is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let r = sxy / (sxx * syy).sqrt();
    // Rounding can push |r| a hair past 1 for perfectly (anti)correlated data.
    Some(if r.is_finite() { r.clamp(-1.0, 1.0) } else { r })
}

/// Figures for one set of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Figures {
    pub samples: usize,
    pub rmse: BTreeMap<Channel, f64>,
    /// Absent for channels whose correlation was undefined.
    pub correlation: BTreeMap<Channel, f64>,
}

/// Figures for one value of the independent variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FomEntry {
    pub key: GroupKey,
    pub figures: Figures,
}

/// Ordered figures of merit for one (channel set, independent variable).
#[derive(Debug)]
pub struct FomSeries {
    pub variable: IndependentVariable,
    pub channels: Vec<Channel>,
    /// Strictly ascending by key.
    pub entries: Vec<FomEntry>,
    /// Groups whose correlation could not be computed.
    pub failures: Vec<BeamError>,
}

impl FomSeries {
    pub fn keys(&self) -> impl Iterator<Item = GroupKey> + '_ {
        self.entries.iter().map(|e| e.key)
    }
}

struct ChannelColumns {
    channel: Channel,
    diff: Vec<f64>,
    model: Vec<f64>,
    scope: Vec<f64>,
}

fn channel_columns(table: &SampleTable, channels: &[Channel]) -> BeamResult<Vec<ChannelColumns>> {
    channels
        .iter()
        .map(|&channel| {
            Ok(ChannelColumns {
                channel,
                diff: table.require(&channel.diff_column())?.magnitudes(),
                model: table.require(&channel.model_column())?.plottable(),
                scope: table.require(&channel.scope_column())?.plottable(),
            })
        })
        .collect()
}

fn figures_for_rows(columns: &[ChannelColumns], rows: &[usize]) -> (Figures, Vec<Channel>) {
    let mut rmse_by = BTreeMap::new();
    let mut corr_by = BTreeMap::new();
    let mut undefined = Vec::new();
    for col in columns {
        let diff: Vec<f64> = rows.iter().map(|&i| col.diff[i]).collect();
        rmse_by.insert(col.channel, rmse(&diff));

        let model: Vec<f64> = rows.iter().map(|&i| col.model[i]).collect();
        let scope: Vec<f64> = rows.iter().map(|&i| col.scope[i]).collect();
        match pearson(&model, &scope) {
            Some(r) => {
                corr_by.insert(col.channel, r);
            }
            None => undefined.push(col.channel),
        }
    }
    (
        Figures {
            samples: rows.len(),
            rmse: rmse_by,
            correlation: corr_by,
        },
        undefined,
    )
}

/// Figures over the whole merged table, without grouping.
pub fn overall_figures(table: &SampleTable, channels: &[Channel]) -> BeamResult<Figures> {
    let columns = channel_columns(table, channels)?;
    let rows: Vec<usize> = (0..table.height()).collect();
    let (figures, undefined) = figures_for_rows(&columns, &rows);
    if !undefined.is_empty() {
        warn!(
            samples = rows.len(),
            "overall correlation undefined for {} channel(s)",
            undefined.len()
        );
    }
    Ok(figures)
}

/// Groups `table` by `variable` and scores every channel in each group.
pub fn figures_of_merit(
    table: &SampleTable,
    channels: &[Channel],
    variable: IndependentVariable,
) -> BeamResult<FomSeries> {
    let columns = channel_columns(table, channels)?;
    let partitions = table.partition(variable);

    let mut scored: Vec<(GroupKey, Figures, Vec<Channel>)> = partitions
        .par_iter()
        .map(|p| {
            let (figures, undefined) = figures_for_rows(&columns, &p.rows);
            (p.key, figures, undefined)
        })
        .collect();
    scored.sort_by(|a, b| match (a.0, b.0) {
        (GroupKey::Time(x), GroupKey::Time(y)) => x.cmp(&y),
        (GroupKey::Freq(x), GroupKey::Freq(y)) => x.total_cmp(&y),
        (GroupKey::Time(_), GroupKey::Freq(_)) => std::cmp::Ordering::Less,
        (GroupKey::Freq(_), GroupKey::Time(_)) => std::cmp::Ordering::Greater,
    });

    let mut entries = Vec::with_capacity(scored.len());
    let mut failures = Vec::new();
    for (key, figures, undefined) in scored {
        for channel in undefined {
            failures.push(BeamError::InsufficientData {
                channel,
                variable,
                group: key.to_string(),
                samples: figures.samples,
            });
        }
        entries.push(FomEntry { key, figures });
    }

    for failure in &failures {
        warn!("{failure}");
    }
    debug!(
        %variable,
        groups = entries.len(),
        failures = failures.len(),
        "computed figures of merit"
    );
    Ok(FomSeries {
        variable,
        channels: channels.to_vec(),
        entries,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use chrono::{NaiveDate, NaiveDateTime};
    use num_complex::Complex64;

    fn t(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, 5)
            .unwrap()
            .and_hms_opt(13, 0, sec)
            .unwrap()
    }

    fn merged(times: Vec<NaiveDateTime>, freqs: Vec<f64>, model: Vec<f64>, scope: Vec<f64>) -> SampleTable {
        let diff = model.iter().zip(&scope).map(|(m, s)| m - s).collect();
        SampleTable::new(times, freqs)
            .unwrap()
            .with_column("xx_model", Column::Real(model))
            .unwrap()
            .with_column("xx_scope", Column::Real(scope))
            .unwrap()
            .with_column("xx_diff", Column::Real(diff))
            .unwrap()
    }

    #[test]
    fn rmse_per_time_group_in_ascending_order() {
        // diffs: t1 -> [1, -1], t0 -> [3]
        let table = merged(
            vec![t(1), t(0), t(1)],
            vec![100.0, 100.0, 200.0],
            vec![2.0, 3.0, 0.0],
            vec![1.0, 0.0, 1.0],
        );
        let series = figures_of_merit(&table, &[Channel::Xx], IndependentVariable::Time).unwrap();
        let keys: Vec<GroupKey> = series.keys().collect();
        assert_eq!(keys, vec![GroupKey::Time(t(0)), GroupKey::Time(t(1))]);
        assert_eq!(series.entries[0].figures.rmse[&Channel::Xx], 3.0);
        assert_eq!(series.entries[1].figures.rmse[&Channel::Xx], 1.0);
    }

    #[test]
    fn singleton_groups_report_insufficient_data_and_continue() {
        let table = merged(
            vec![t(0), t(0), t(0)],
            vec![100.0, 100.0, 200.0],
            vec![1.0, 2.0, 5.0],
            vec![1.0, 2.5, 4.0],
        );
        let series = figures_of_merit(&table, &[Channel::Xx], IndependentVariable::Freq).unwrap();
        assert_eq!(series.entries.len(), 2);
        assert!((series.entries[0].figures.correlation[&Channel::Xx] - 1.0).abs() < 1e-12);
        assert!(series.entries[1].figures.correlation.is_empty());
        assert_eq!(series.entries[1].figures.rmse[&Channel::Xx], 1.0);
        assert_eq!(series.failures.len(), 1);
        match &series.failures[0] {
            BeamError::InsufficientData {
                channel,
                variable,
                group,
                samples,
            } => {
                assert_eq!(*channel, Channel::Xx);
                assert_eq!(*variable, IndependentVariable::Freq);
                assert_eq!(group, "200");
                assert_eq!(*samples, 1);
            }
            other => panic!("unexpected failure {other:?}"),
        }
    }

    #[test]
    fn keys_are_strictly_ascending() {
        let freqs = vec![300.0, 100.0, 200.0, 100.0, 300.0, 200.0];
        let table = merged(vec![t(0); 6], freqs, vec![1.0; 6], vec![0.5; 6]);
        let series = figures_of_merit(&table, &[Channel::Xx], IndependentVariable::Freq).unwrap();
        let keys: Vec<f64> = series
            .keys()
            .map(|k| match k {
                GroupKey::Freq(f) => f,
                GroupKey::Time(_) => unreachable!(),
            })
            .collect();
        assert_eq!(keys, vec![100.0, 200.0, 300.0]);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn complex_channel_uses_modulus() {
        let table = SampleTable::new(vec![t(0), t(0)], vec![1.0, 2.0])
            .unwrap()
            .with_column(
                "xy_model",
                Column::Complex(vec![Complex64::new(3.0, 4.0), Complex64::new(0.0, 2.0)]),
            )
            .unwrap()
            .with_column(
                "xy_scope",
                Column::Complex(vec![Complex64::new(0.0, 5.0), Complex64::new(1.0, 0.0)]),
            )
            .unwrap()
            .with_column(
                "xy_diff",
                Column::Complex(vec![Complex64::new(3.0, -1.0), Complex64::new(-1.0, 2.0)]),
            )
            .unwrap();
        let figures = overall_figures(&table, &[Channel::Xy]).unwrap();
        // |diff|^2 = 10 and 5
        assert!((figures.rmse[&Channel::Xy] - 7.5f64.sqrt()).abs() < 1e-12);
        // moduli: model [5, 2], scope [5, 1]
        assert!((figures.correlation[&Channel::Xy] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_edge_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert!(pearson(&[1.0, 1.0], &[1.0, 2.0]).unwrap().is_nan());
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_diff_is_schema_error() {
        let table = SampleTable::new(vec![t(0)], vec![1.0]).unwrap();
        assert!(matches!(
            figures_of_merit(&table, &[Channel::I], IndependentVariable::Time),
            Err(BeamError::Schema(_))
        ));
    }
}
