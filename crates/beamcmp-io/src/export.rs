//! CSV export of merged tables and figure-of-merit sequences.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use beamcmp_core::table::{ELAPSED, FREQ, TIME};
use beamcmp_core::{
    Channel, Column, Figures, FomSeries, GroupKey, IndependentVariable, SampleTable,
};
use polars::prelude::*;
use tracing::info;

use crate::cell::{format_complex, format_instant};

fn column_series(name: &str, column: &Column) -> Series {
    match column {
        Column::Real(values) => Series::new(name, values.as_slice()),
        Column::Complex(values) => Series::new(
            name,
            values.iter().map(|v| format_complex(*v)).collect::<Vec<_>>(),
        ),
    }
}

/// Key columns and `d_Time` first, then every value column in table order.
pub fn table_to_frame(table: &SampleTable) -> Result<DataFrame> {
    let mut columns = vec![
        Series::new(
            TIME,
            table.time().iter().map(format_instant).collect::<Vec<_>>(),
        ),
        Series::new(FREQ, table.freq()),
    ];
    if let Some(column) = table.column(ELAPSED) {
        columns.push(column_series(ELAPSED, column));
    }
    for name in table.value_column_names() {
        if let Some(column) = table.column(&name) {
            columns.push(column_series(&name, column));
        }
    }
    DataFrame::new(columns).context("assembling merged table frame")
}

fn key_series(variable: IndependentVariable, keys: impl Iterator<Item = GroupKey>) -> Series {
    let name = variable.to_string();
    match variable {
        IndependentVariable::Freq => Series::new(
            &name,
            keys.filter_map(|k| match k {
                GroupKey::Freq(f) => Some(f),
                GroupKey::Time(_) => None,
            })
            .collect::<Vec<_>>(),
        ),
        IndependentVariable::Time => Series::new(
            &name,
            keys.filter_map(|k| match k {
                GroupKey::Time(t) => Some(format_instant(&t)),
                GroupKey::Freq(_) => None,
            })
            .collect::<Vec<_>>(),
        ),
    }
}

fn figure_columns<'a>(
    channels: &[Channel],
    figures: impl Iterator<Item = &'a Figures> + Clone,
) -> Vec<Series> {
    let mut columns = vec![Series::new(
        "samples",
        figures.clone().map(|f| f.samples as u64).collect::<Vec<_>>(),
    )];
    for &channel in channels {
        columns.push(Series::new(
            &format!("{channel}_rmse"),
            figures
                .clone()
                .map(|f| f.rmse.get(&channel).copied())
                .collect::<Vec<_>>(),
        ));
        columns.push(Series::new(
            &format!("{channel}_corr"),
            figures
                .clone()
                .map(|f| f.correlation.get(&channel).copied())
                .collect::<Vec<_>>(),
        ));
    }
    columns
}

/// One row per group: the key, the sample count, then `<c>_rmse` and
/// `<c>_corr` per channel. Undefined correlations are left empty.
pub fn fom_to_frame(series: &FomSeries) -> Result<DataFrame> {
    let mut columns = vec![key_series(series.variable, series.keys())];
    columns.extend(figure_columns(
        &series.channels,
        series.entries.iter().map(|e| &e.figures),
    ));
    DataFrame::new(columns).context("assembling figure-of-merit frame")
}

/// A single-row frame of the whole-table figures.
pub fn overall_to_frame(channels: &[Channel], figures: &Figures) -> Result<DataFrame> {
    DataFrame::new(figure_columns(channels, std::iter::once(figures)))
        .context("assembling overall figure frame")
}

pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .with_context(|| format!("writing CSV file {}", path.display()))?;
    info!(path = %path.display(), rows = df.height(), "wrote CSV");
    Ok(())
}

pub fn write_table(table: &SampleTable, path: &Path) -> Result<()> {
    write_frame(&mut table_to_frame(table)?, path)
}

pub fn write_fom(series: &FomSeries, path: &Path) -> Result<()> {
    write_frame(&mut fom_to_frame(series)?, path)
}

pub fn write_overall(channels: &[Channel], figures: &Figures, path: &Path) -> Result<()> {
    write_frame(&mut overall_to_frame(channels, figures)?, path)
}
