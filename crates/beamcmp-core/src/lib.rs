//! # beamcmp-core: Model vs. Observation Beam Comparison
//!
//! Aligns a simulated antenna-beam model with a telescope measurement, both
//! sampled on `(Time, Freq)`, and scores their agreement.
//!
//! ## Pipeline
//!
//! ```text
//! raw tables ─▶ crop ─▶ normalize ─▶ derive channels ─▶ align ─▶ difference ─▶ figures of merit
//! ```
//!
//! - [`crop`]: zero removal plus median/mean/percentile outlier cuts
//! - [`normalize`]: peak normalization overall, per frequency or per time
//! - [`channel`]: xx, xy, yy from Jones elements; Stokes U, V, I, Q from those
//! - [`align`]: exact inner join on `(Time, Freq)` with `_model`/`_scope` suffixes
//! - [`diff`]: subtract, divide or inverse-divide into `<c>_diff`
//! - [`fom`]: RMSE and Pearson correlation grouped by `Time` or `Freq`
//!
//! [`pipeline::run_comparison`] chains all of them for one [`Config`].
//!
//! ## Example
//!
//! ```ignore
//! use beamcmp_core::{run_comparison, Config};
//!
//! let output = run_comparison(model, scope, &Config::default())?;
//! for series in &output.series {
//!     for entry in &series.entries {
//!         println!("{} {:?}", entry.key, entry.figures.rmse);
//!     }
//! }
//! ```

pub mod align;
pub mod channel;
pub mod config;
pub mod crop;
pub mod diff;
pub mod error;
pub mod fom;
pub mod normalize;
pub mod pipeline;
pub mod table;

pub use channel::Channel;
pub use config::{
    AlignmentConfig, ChannelSelection, Config, CropBasis, CropConfig, CropKind, DataTarget,
    DiffMode, DifferenceConfig, IndependentVariable, NormMode, NormalizationConfig,
    SelectionConfig, Source,
};
pub use error::{BeamError, BeamResult};
pub use fom::{Figures, FomEntry, FomSeries};
pub use pipeline::{prepare_source, run_comparison, ComparisonOutput};
pub use table::{Column, GroupKey, SampleTable};
