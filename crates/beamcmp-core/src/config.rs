//! Run configuration for a model/scope comparison.
//!
//! The configuration is immutable once built. It can be deserialized from
//! TOML (every section is optional and falls back to defaults) and every enum
//! also parses from the short codes accepted on the command line, so
//! `"f"`, `"per-frequency"` and `"frequency"` all select the same mode.
//! Unknown values are rejected with [`BeamError::Config`] rather than
//! silently replaced by a default.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::channel::Channel;
use crate::error::{BeamError, BeamResult};

macro_rules! string_enum {
    ($ty:ident, $field:literal) => {
        impl TryFrom<String> for $ty {
            type Error = BeamError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl $ty {
            const FIELD: &'static str = $field;
        }
    };
}

/// How a channel is rescaled before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum NormMode {
    /// Divide by the maximum magnitude of the whole column.
    #[default]
    Overall,
    /// Divide by the maximum magnitude within each frequency.
    PerFrequency,
    /// Divide by the maximum magnitude within each timestamp.
    PerTime,
    None,
}

string_enum!(NormMode, "normalization.mode");

impl FromStr for NormMode {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "o" | "overall" => Ok(NormMode::Overall),
            "f" | "freq" | "frequency" | "per-frequency" | "per_frequency" => {
                Ok(NormMode::PerFrequency)
            }
            "t" | "time" | "per-time" | "per_time" => Ok(NormMode::PerTime),
            "n" | "none" => Ok(NormMode::None),
            _ => Err(BeamError::config(
                Self::FIELD,
                s,
                "expected overall (o), per-frequency (f), per-time (t) or none (n)",
            )),
        }
    }
}

impl fmt::Display for NormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NormMode::Overall => "overall",
            NormMode::PerFrequency => "per-frequency",
            NormMode::PerTime => "per-time",
            NormMode::None => "none",
        })
    }
}

/// Which source tables a normalization or crop applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DataTarget {
    #[default]
    Scope,
    Model,
    Both,
    None,
}

impl DataTarget {
    /// Parses a target, reporting failures against `field`
    /// (`normalization.target` or `crop.target`).
    pub fn parse_for(field: &'static str, s: &str) -> BeamResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "scope" => Ok(DataTarget::Scope),
            "m" | "model" => Ok(DataTarget::Model),
            "b" | "both" => Ok(DataTarget::Both),
            "n" | "none" => Ok(DataTarget::None),
            _ => Err(BeamError::config(
                field,
                s,
                "expected scope (s), model (m), both (b) or none (n)",
            )),
        }
    }

    pub fn includes(self, source: Source) -> bool {
        matches!(
            (self, source),
            (DataTarget::Both, _)
                | (DataTarget::Scope, Source::Scope)
                | (DataTarget::Model, Source::Model)
        )
    }
}

string_enum!(DataTarget, "target");

impl FromStr for DataTarget {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_for(Self::FIELD, s)
    }
}

fn normalization_target<'de, D: Deserializer<'de>>(d: D) -> Result<DataTarget, D::Error> {
    let s = String::deserialize(d)?;
    DataTarget::parse_for("normalization.target", &s).map_err(de::Error::custom)
}

fn crop_target<'de, D: Deserializer<'de>>(d: D) -> Result<DataTarget, D::Error> {
    let s = String::deserialize(d)?;
    DataTarget::parse_for("crop.target", &s).map_err(de::Error::custom)
}

impl fmt::Display for DataTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataTarget::Scope => "scope",
            DataTarget::Model => "model",
            DataTarget::Both => "both",
            DataTarget::None => "none",
        })
    }
}

/// Origin of a sample table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Model,
    Scope,
}

impl Source {
    /// Column suffix applied by the aligner.
    pub fn suffix(self) -> &'static str {
        match self {
            Source::Model => "_model",
            Source::Scope => "_scope",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Model => "model",
            Source::Scope => "scope",
        })
    }
}

/// Statistic the crop threshold is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum CropKind {
    /// Threshold = median × magnitude.
    #[default]
    Median,
    /// Threshold = mean × magnitude.
    Mean,
    /// Threshold = the magnitude-th percentile (0 to 100, exclusive).
    Percentile,
}

string_enum!(CropKind, "crop.kind");

impl FromStr for CropKind {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "median" => Ok(CropKind::Median),
            "mean" => Ok(CropKind::Mean),
            "percentile" => Ok(CropKind::Percentile),
            _ => Err(BeamError::config(
                Self::FIELD,
                s,
                "expected median, mean or percentile",
            )),
        }
    }
}

impl fmt::Display for CropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CropKind::Median => "median",
            CropKind::Mean => "mean",
            CropKind::Percentile => "percentile",
        })
    }
}

/// Partitioning applied before cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum CropBasis {
    #[default]
    Overall,
    PerFrequency,
    None,
}

string_enum!(CropBasis, "crop.basis");

impl FromStr for CropBasis {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "o" | "overall" => Ok(CropBasis::Overall),
            "f" | "freq" | "frequency" | "per-frequency" | "per_frequency" => {
                Ok(CropBasis::PerFrequency)
            }
            "n" | "none" => Ok(CropBasis::None),
            _ => Err(BeamError::config(
                Self::FIELD,
                s,
                "expected overall (o), per-frequency (f) or none (n)",
            )),
        }
    }
}

impl fmt::Display for CropBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CropBasis::Overall => "overall",
            CropBasis::PerFrequency => "per-frequency",
            CropBasis::None => "none",
        })
    }
}

/// Operator producing `<channel>_diff` from the model and scope values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DiffMode {
    /// `model - scope`
    #[default]
    Subtract,
    /// `model / scope`
    Divide,
    /// `scope / model`
    InverseDivide,
}

string_enum!(DiffMode, "difference.mode");

impl FromStr for DiffMode {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sub" | "subtract" => Ok(DiffMode::Subtract),
            "div" | "divide" => Ok(DiffMode::Divide),
            "idiv" | "inverse-divide" | "inverse_divide" => Ok(DiffMode::InverseDivide),
            _ => Err(BeamError::config(
                Self::FIELD,
                s,
                "expected subtract (sub), divide (div) or inverse-divide (idiv)",
            )),
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiffMode::Subtract => "subtract",
            DiffMode::Divide => "divide",
            DiffMode::InverseDivide => "inverse-divide",
        })
    }
}

/// Grouping axis for figures of merit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum IndependentVariable {
    Time,
    Freq,
}

string_enum!(IndependentVariable, "selection.independent_vars");

impl IndependentVariable {
    pub const ALL: [IndependentVariable; 2] = [IndependentVariable::Time, IndependentVariable::Freq];
}

impl FromStr for IndependentVariable {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" | "t" => Ok(IndependentVariable::Time),
            "freq" | "frequency" | "f" => Ok(IndependentVariable::Freq),
            _ => Err(BeamError::config(Self::FIELD, s, "expected Time or Freq")),
        }
    }
}

impl fmt::Display for IndependentVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndependentVariable::Time => "Time",
            IndependentVariable::Freq => "Freq",
        })
    }
}

/// Ordered, duplicate-free set of requested channels.
///
/// Built from selection tokens: `all`, `linear`, `stokes` or a single
/// channel name. Group tokens expand in place; a channel requested twice
/// keeps its first position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct ChannelSelection(Vec<Channel>);

impl ChannelSelection {
    pub fn all() -> Self {
        ChannelSelection(Channel::ALL.to_vec())
    }

    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> BeamResult<Self> {
        let mut channels: Vec<Channel> = Vec::new();
        let mut push = |c: Channel| {
            if !channels.contains(&c) {
                channels.push(c);
            }
        };
        for token in tokens {
            let token = token.as_ref().trim();
            match token {
                "all" => Channel::ALL.into_iter().for_each(&mut push),
                "linear" => Channel::LINEAR.into_iter().for_each(&mut push),
                "stokes" => Channel::STOKES.into_iter().for_each(&mut push),
                other => push(other.parse().map_err(|_| {
                    BeamError::config(
                        "selection.channels",
                        other,
                        "expected all, linear, stokes, xx, xy, yy, U, V, I or Q",
                    )
                })?),
            }
        }
        if channels.is_empty() {
            return Err(BeamError::config(
                "selection.channels",
                "[]",
                "at least one channel must be requested",
            ));
        }
        Ok(ChannelSelection(channels))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.0
    }
}

impl Default for ChannelSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<Vec<String>> for ChannelSelection {
    type Error = BeamError;

    fn try_from(tokens: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_tokens(&tokens)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    pub mode: NormMode,
    #[serde(deserialize_with = "normalization_target")]
    pub target: DataTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    pub kind: CropKind,
    pub basis: CropBasis,
    /// Multiple of the median/mean, or the percentile level. Read through
    /// [`CropConfig::magnitude`], which drops the sign.
    #[serde(rename = "magnitude")]
    pub raw_magnitude: f64,
    #[serde(deserialize_with = "crop_target")]
    pub target: DataTarget,
}

impl CropConfig {
    pub fn magnitude(&self) -> f64 {
        self.raw_magnitude.abs()
    }

    pub fn validate(&self) -> BeamResult<()> {
        let magnitude = self.magnitude();
        if !magnitude.is_finite() {
            return Err(BeamError::config(
                "crop.magnitude",
                self.raw_magnitude,
                "must be a finite number",
            ));
        }
        if self.kind == CropKind::Percentile && magnitude >= 100.0 {
            return Err(BeamError::config(
                "crop.magnitude",
                self.raw_magnitude,
                "percentile crops require a level below 100",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DifferenceConfig {
    pub mode: DiffMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    pub channels: ChannelSelection,
    /// Score every channel in its own series instead of one combined series.
    pub each: bool,
    pub independent_vars: Vec<IndependentVariable>,
    /// Frequencies (Hz) to keep after merging; empty keeps all.
    pub freq_filter: Vec<f64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            channels: ChannelSelection::all(),
            each: false,
            independent_vars: IndependentVariable::ALL.to_vec(),
            freq_filter: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignmentConfig {
    /// Seconds the scope clock runs ahead of the model; subtracted from the
    /// scope `Time` column before the join.
    pub time_offset_secs: i64,
}

/// Full comparison configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub normalization: NormalizationConfig,
    pub crop: CropConfig,
    pub difference: DifferenceConfig,
    pub selection: SelectionConfig,
    pub alignment: AlignmentConfig,
}

impl Config {
    pub fn validate(&self) -> BeamResult<()> {
        self.crop.validate()?;
        if self.selection.independent_vars.is_empty() {
            return Err(BeamError::config(
                "selection.independent_vars",
                "[]",
                "at least one independent variable must be requested",
            ));
        }
        if let Some(bad) = self
            .selection
            .freq_filter
            .iter()
            .find(|f| !f.is_finite() || **f < 0.0)
        {
            return Err(BeamError::config(
                "selection.freq_filter",
                bad,
                "frequencies must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Channel sets to score: one combined set, or one per channel.
    pub fn channel_sets(&self) -> Vec<Vec<Channel>> {
        let channels = self.selection.channels.channels();
        if self.selection.each {
            channels.iter().map(|c| vec![*c]).collect()
        } else {
            vec![channels.to_vec()]
        }
    }
}
