//! Resolves a comparison [`Config`] from an optional TOML file and the
//! command-line overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use beamcmp_core::{ChannelSelection, Config};
use beamcmp_io::read_frequency_list;
use tracing::debug;

use crate::cli::CompareArgs;

/// Loads `path`, or the defaults when no file is given.
pub fn load_from(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

/// Applies every flag that was given on top of `config`.
///
/// `each` may also arrive as a `--values` token.
pub fn apply_overrides(config: &mut Config, args: &CompareArgs) -> Result<()> {
    if let Some(mode) = args.norm {
        config.normalization.mode = mode;
    }
    if let Some(target) = args.norm_data {
        config.normalization.target = target;
    }
    if let Some(kind) = args.crop_type {
        config.crop.kind = kind;
    }
    if let Some(magnitude) = args.crop {
        config.crop.raw_magnitude = magnitude;
    }
    if let Some(basis) = args.crop_basis {
        config.crop.basis = basis;
    }
    if let Some(target) = args.crop_data {
        config.crop.target = target;
    }
    if let Some(mode) = args.diff {
        config.difference.mode = mode;
    }

    let (each, tokens): (Vec<&String>, Vec<&String>) = args
        .values
        .iter()
        .partition(|t| t.trim().eq_ignore_ascii_case("each"));
    if !tokens.is_empty() {
        config.selection.channels = ChannelSelection::from_tokens(&tokens)?;
    }
    if args.each || !each.is_empty() {
        config.selection.each = true;
    }
    if !args.by.is_empty() {
        config.selection.independent_vars = args.by.clone();
    }
    if let Some(offset) = args.offset {
        config.alignment.time_offset_secs = offset;
    }

    let mut freqs = args.freq.clone();
    if let Some(path) = &args.freq_file {
        freqs.extend(read_frequency_list(path)?);
    }
    if !freqs.is_empty() {
        config.selection.freq_filter = freqs;
    }

    config.validate()?;
    Ok(())
}

/// File configuration with the flags of `args` applied.
pub fn resolve(args: &CompareArgs) -> Result<Config> {
    let mut config = load_from(args.config.as_deref())?;
    apply_overrides(&mut config, args)?;
    Ok(config)
}
