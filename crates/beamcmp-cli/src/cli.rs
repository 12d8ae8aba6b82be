use std::path::PathBuf;

use beamcmp_core::{
    BeamResult, CropBasis, CropKind, DataTarget, DiffMode, IndependentVariable, NormMode,
};
use clap::{Args, Parser, Subcommand, ValueHint};

#[derive(Parser, Debug)]
#[command(name = "beamcmp", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Legacy verbosity: 0 errors only, 1 warnings, 2 everything
    #[arg(long, global = true)]
    pub verbose: Option<u8>,

    /// Worker threads (`auto` or a number)
    #[arg(long, default_value = "auto", global = true)]
    pub threads: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `--verbose` wins over `--log-level` when given.
    pub fn max_level(&self) -> tracing::Level {
        match self.verbose {
            Some(0) => tracing::Level::ERROR,
            Some(1) => tracing::Level::WARN,
            Some(_) => tracing::Level::DEBUG,
            None => self.log_level,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare a beam model against telescope data
    Compare(CompareArgs),
    /// Derive all polarimetric channels for a single table
    Derive {
        /// Model (Jones elements) or scope (xx, xy, yy) CSV file
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output CSV file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct CompareArgs {
    /// Model CSV file (DreamBeam style Jones elements)
    #[arg(value_hint = ValueHint::FilePath)]
    pub model: PathBuf,
    /// Scope CSV file (xx, xy, yy)
    #[arg(value_hint = ValueHint::FilePath)]
    pub scope: PathBuf,
    /// TOML configuration file; flags below override it
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Directory for the merged table, figure-of-merit files and run manifest
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub out_dir: Option<PathBuf>,

    /// Normalization: overall (o), per-frequency (f), per-time (t), none (n)
    #[arg(long)]
    pub norm: Option<NormMode>,
    /// Normalized sources: scope (s), model (m), both (b), none (n)
    #[arg(long, value_parser = normalization_target)]
    pub norm_data: Option<DataTarget>,
    /// Crop statistic: median, mean or percentile
    #[arg(long)]
    pub crop_type: Option<CropKind>,
    /// Crop multiple (median/mean) or percentile level
    #[arg(long, allow_hyphen_values = true)]
    pub crop: Option<f64>,
    /// Crop basis: overall (o), per-frequency (f), none (n)
    #[arg(long)]
    pub crop_basis: Option<CropBasis>,
    /// Cropped sources: scope (s), model (m), both (b), none (n)
    #[arg(long, value_parser = crop_target)]
    pub crop_data: Option<DataTarget>,
    /// Difference: sub, div or idiv
    #[arg(long)]
    pub diff: Option<DiffMode>,

    /// Channels: all, linear, stokes, xx, xy, yy, U, V, I, Q
    #[arg(long, value_delimiter = ',')]
    pub values: Vec<String>,
    /// Score each channel separately
    #[arg(long)]
    pub each: bool,
    /// Independent variables to group by: Time, Freq
    #[arg(long, value_delimiter = ',')]
    pub by: Vec<IndependentVariable>,
    /// Seconds the scope clock runs ahead of the model
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<i64>,
    /// Frequencies (Hz) to keep
    #[arg(long, value_delimiter = ',')]
    pub freq: Vec<f64>,
    /// Headerless CSV listing frequencies to keep in its first column
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub freq_file: Option<PathBuf>,
}

fn normalization_target(s: &str) -> BeamResult<DataTarget> {
    DataTarget::parse_for("normalization.target", s)
}

fn crop_target(s: &str) -> BeamResult<DataTarget> {
    DataTarget::parse_for("crop.target", s)
}
