//! End-to-end comparison: prepare both sources, align, difference, score.

use tracing::{debug, info};

use crate::align::{align, apply_time_offset, filter_frequencies};
use crate::channel::{derive_linear, derive_stokes, Channel};
use crate::config::{Config, Source};
use crate::crop::crop;
use crate::diff::difference_all;
use crate::error::{BeamError, BeamResult};
use crate::fom::{figures_of_merit, overall_figures, Figures, FomSeries};
use crate::normalize::normalize_linear;
use crate::table::SampleTable;

/// Everything a comparison run produces.
#[derive(Debug)]
pub struct ComparisonOutput {
    /// Merged table with `<c>_model`, `<c>_scope` and `<c>_diff` for every
    /// requested channel.
    pub merged: SampleTable,
    /// Figures over the whole merged table for every requested channel.
    pub overall: Figures,
    /// One series per requested (channel set, independent variable).
    pub series: Vec<FomSeries>,
    /// Count of infinite/NaN diff values (division modes only).
    pub non_finite_diffs: usize,
}

impl ComparisonOutput {
    /// Per-group failures across all series.
    pub fn failures(&self) -> impl Iterator<Item = &BeamError> {
        self.series.iter().flat_map(|s| s.failures.iter())
    }
}

/// Derives linear channels, then crops and normalizes them when the
/// configured targets include `source`, then derives the Stokes channels
/// from the transformed linear values.
pub fn prepare_source(
    mut table: SampleTable,
    source: Source,
    config: &Config,
) -> BeamResult<SampleTable> {
    derive_linear(&mut table)?;
    let linear: Vec<&str> = Channel::LINEAR.iter().map(|c| c.name()).collect();
    let mut table = table.select(&linear);

    if config.crop.target.includes(source) {
        let before = table.height();
        table = crop(&table, &config.crop)?;
        info!(
            %source,
            before,
            after = table.height(),
            kind = %config.crop.kind,
            basis = %config.crop.basis,
            "cropped"
        );
    }
    if config.normalization.target.includes(source) {
        normalize_linear(&mut table, config.normalization.mode)?;
        debug!(%source, mode = %config.normalization.mode, "normalized linear channels");
    }
    derive_stokes(&mut table)?;
    Ok(table)
}

/// Runs the full comparison on two freshly ingested tables.
pub fn run_comparison(
    model: SampleTable,
    mut scope: SampleTable,
    config: &Config,
) -> BeamResult<ComparisonOutput> {
    config.validate()?;
    apply_time_offset(&mut scope, config.alignment.time_offset_secs);

    let model = prepare_source(model, Source::Model, config)?;
    let scope = prepare_source(scope, Source::Scope, config)?;

    let merged = align(&model, &scope)?;
    let mut merged = filter_frequencies(&merged, &config.selection.freq_filter)?;

    let channels = config.selection.channels.channels();
    let non_finite_diffs = difference_all(&mut merged, channels, config.difference.mode)?;

    let overall = overall_figures(&merged, channels)?;
    let mut series = Vec::new();
    for set in config.channel_sets() {
        for &variable in &config.selection.independent_vars {
            series.push(figures_of_merit(&merged, &set, variable)?);
        }
    }

    info!(
        rows = merged.height(),
        series = series.len(),
        "comparison complete"
    );
    Ok(ComparisonOutput {
        merged,
        overall,
        series,
        non_finite_diffs,
    })
}
