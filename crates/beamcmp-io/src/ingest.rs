//! CSV ingestion into [`SampleTable`]s.
//!
//! Every file is read with string-typed columns so complex and instant
//! cells survive polars' type inference. Header names and cells are
//! trimmed, which covers DreamBeam's `", "` separators.

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use beamcmp_core::channel::{Channel, JONES};
use beamcmp_core::table::{is_key_column, ELAPSED, FREQ, TIME};
use beamcmp_core::{BeamError, BeamResult, Column, SampleTable};
use polars::prelude::*;
use tracing::debug;

use crate::cell::{looks_complex, parse_complex, parse_instant, parse_real};

fn read_text_frame(path: &Path, has_header: bool) -> Result<DataFrame> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    CsvReader::new(&mut file)
        .has_header(has_header)
        .infer_schema(Some(0))
        .finish()
        .with_context(|| format!("reading CSV file {}", path.display()))
}

fn cells(df: &DataFrame, name: &str) -> BeamResult<Vec<String>> {
    let series = df
        .column(name)
        .map_err(|e| BeamError::Schema(format!("column '{}': {e}", name.trim())))?;
    let text = series
        .utf8()
        .map_err(|e| BeamError::Schema(format!("column '{}': {e}", name.trim())))?;
    text.into_iter()
        .enumerate()
        .map(|(row, cell)| {
            cell.map(|c| c.trim().to_string()).ok_or_else(|| {
                BeamError::Schema(format!("column '{}' row {row}: missing value", name.trim()))
            })
        })
        .collect()
}

fn is_known_value_column(name: &str) -> bool {
    name == ELAPSED
        || JONES.contains(&name)
        || Channel::ALL.iter().any(|c| c.name() == name)
}

/// Parses one value column, complex if any cell carries an imaginary part.
pub fn parse_column(name: &str, cells: &[String]) -> BeamResult<Column> {
    if JONES.contains(&name) || cells.iter().any(|c| looks_complex(c)) {
        cells
            .iter()
            .enumerate()
            .map(|(row, c)| parse_complex(c, name, row))
            .collect::<BeamResult<Vec<_>>>()
            .map(Column::Complex)
    } else {
        cells
            .iter()
            .enumerate()
            .map(|(row, c)| parse_real(c, name, row))
            .collect::<BeamResult<Vec<_>>>()
            .map(Column::Real)
    }
}

/// Converts a string-typed frame into a [`SampleTable`].
///
/// Requires `Time` and `Freq`. Jones elements, channel columns and `d_Time`
/// are parsed; any other column is skipped.
pub fn frame_to_table(df: &DataFrame) -> BeamResult<SampleTable> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let find = |wanted: &str| names.iter().find(|n| n.trim() == wanted);

    let time_col = find(TIME).ok_or_else(|| {
        BeamError::Schema(format!("missing required column '{TIME}' (found {names:?})"))
    })?;
    let freq_col = find(FREQ).ok_or_else(|| {
        BeamError::Schema(format!("missing required column '{FREQ}' (found {names:?})"))
    })?;

    let time = cells(df, time_col)?
        .iter()
        .enumerate()
        .map(|(row, c)| parse_instant(c, TIME, row))
        .collect::<BeamResult<Vec<_>>>()?;
    let freq = cells(df, freq_col)?
        .iter()
        .enumerate()
        .map(|(row, c)| parse_real(c, FREQ, row))
        .collect::<BeamResult<Vec<_>>>()?;

    let mut table = SampleTable::new(time, freq)?;
    for raw in &names {
        let name = raw.trim();
        if is_key_column(name) {
            continue;
        }
        if !is_known_value_column(name) {
            debug!(column = name, "skipping unrecognised column");
            continue;
        }
        let column = parse_column(name, &cells(df, raw)?)?;
        table.insert_column(name, column)?;
    }
    Ok(table)
}

/// Reads a model (Jones elements) or scope (linear channels) CSV file.
pub fn read_sample_table(path: &Path) -> Result<SampleTable> {
    let df = read_text_frame(path, true)?;
    let table =
        frame_to_table(&df).with_context(|| format!("ingesting {}", path.display()))?;
    debug!(
        path = %path.display(),
        rows = table.height(),
        columns = ?table.value_column_names(),
        "ingested table"
    );
    Ok(table)
}

/// Reads frequencies from the first column of a headerless CSV file.
pub fn read_frequency_list(path: &Path) -> Result<Vec<f64>> {
    let df = read_text_frame(path, false)?;
    let first = df
        .get_columns()
        .first()
        .ok_or_else(|| anyhow!("{} has no columns", path.display()))?;
    let name = first.name().to_string();
    cells(&df, &name)?
        .iter()
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(row, c)| parse_real(c, "Freq", row).map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("reading frequency list {}", path.display()))
}
