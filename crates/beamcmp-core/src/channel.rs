//! Polarimetric channels and their derivation.
//!
//! Linear channels come either straight from the scope ingestion or from
//! the model's Jones elements:
//!
//! | Channel | Definition |
//! |---------|------------|
//! | xx | \|J11\|² + \|J12\|² |
//! | xy | J11·conj(J21) + J12·conj(J22) |
//! | yy | \|J21\|² + \|J22\|² |
//! | U | Re(xy) |
//! | V | Im(xy) |
//! | I | xx + yy |
//! | Q | xx − yy |
//!
//! Stokes channels are always recomputed from the current linear columns,
//! so deriving after a normalization or crop reflects the transformed data.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use tracing::debug;

use crate::error::{BeamError, BeamResult};
use crate::table::{Column, SampleTable};

pub const JONES: [&str; 4] = ["J11", "J12", "J21", "J22"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Xx,
    Xy,
    Yy,
    U,
    V,
    I,
    Q,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::Xx,
        Channel::Xy,
        Channel::Yy,
        Channel::U,
        Channel::V,
        Channel::I,
        Channel::Q,
    ];
    pub const LINEAR: [Channel; 3] = [Channel::Xx, Channel::Xy, Channel::Yy];
    pub const STOKES: [Channel; 4] = [Channel::U, Channel::V, Channel::I, Channel::Q];

    pub fn name(self) -> &'static str {
        match self {
            Channel::Xx => "xx",
            Channel::Xy => "xy",
            Channel::Yy => "yy",
            Channel::U => "U",
            Channel::V => "V",
            Channel::I => "I",
            Channel::Q => "Q",
        }
    }

    /// Only the cross term carries phase.
    pub fn is_complex(self) -> bool {
        self == Channel::Xy
    }

    pub fn column(self, suffix: &str) -> String {
        format!("{}{suffix}", self.name())
    }

    pub fn model_column(self) -> String {
        self.column("_model")
    }

    pub fn scope_column(self) -> String {
        self.column("_scope")
    }

    pub fn diff_column(self) -> String {
        self.column("_diff")
    }
}

impl FromStr for Channel {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == s || c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                BeamError::config(
                    "channel",
                    s,
                    "expected one of xx, xy, yy, U, V, I, Q",
                )
            })
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn has_linear(table: &SampleTable) -> bool {
    Channel::LINEAR
        .iter()
        .all(|c| table.has_column(c.name()))
}

fn jones(table: &SampleTable, name: &str) -> BeamResult<Vec<Complex64>> {
    Ok(table.require(name)?.to_complex())
}

/// Adds xx, xy and yy from the Jones elements unless all three are present.
pub fn derive_linear(table: &mut SampleTable) -> BeamResult<()> {
    if has_linear(table) {
        return Ok(());
    }
    let missing_jones: Vec<&str> = JONES
        .iter()
        .copied()
        .filter(|name| !table.has_column(name))
        .collect();
    if !missing_jones.is_empty() {
        let missing_linear: Vec<&str> = Channel::LINEAR
            .iter()
            .map(|c| c.name())
            .filter(|name| !table.has_column(name))
            .collect();
        return Err(BeamError::Schema(format!(
            "need Jones elements {JONES:?} or linear channels [xx, xy, yy]; missing Jones {missing_jones:?}, missing linear {missing_linear:?}"
        )));
    }

    let j11 = jones(table, "J11")?;
    let j12 = jones(table, "J12")?;
    let j21 = jones(table, "J21")?;
    let j22 = jones(table, "J22")?;

    let xx = j11
        .iter()
        .zip(&j12)
        .map(|(a, b)| a.norm_sqr() + b.norm_sqr())
        .collect();
    let yy = j21
        .iter()
        .zip(&j22)
        .map(|(a, b)| a.norm_sqr() + b.norm_sqr())
        .collect();
    let xy = (0..table.height())
        .map(|i| j11[i] * j21[i].conj() + j12[i] * j22[i].conj())
        .collect();

    table.insert_column("xx", Column::Real(xx))?;
    table.insert_column("xy", Column::Complex(xy))?;
    table.insert_column("yy", Column::Real(yy))?;
    debug!(rows = table.height(), "derived linear channels from Jones elements");
    Ok(())
}

/// Recomputes U, V, I and Q from the current xx, xy and yy columns.
pub fn derive_stokes(table: &mut SampleTable) -> BeamResult<()> {
    let xx = table.real("xx")?.to_vec();
    let yy = table.real("yy")?.to_vec();
    let xy = table.require("xy")?.to_complex();

    let u = xy.iter().map(|c| c.re).collect();
    let v = xy.iter().map(|c| c.im).collect();
    let i = xx.iter().zip(&yy).map(|(a, b)| a + b).collect();
    let q = xx.iter().zip(&yy).map(|(a, b)| a - b).collect();

    table.insert_column("U", Column::Real(u))?;
    table.insert_column("V", Column::Real(v))?;
    table.insert_column("I", Column::Real(i))?;
    table.insert_column("Q", Column::Real(q))?;
    Ok(())
}

/// Ensures all seven channels are present and consistent.
pub fn derive_channels(table: &mut SampleTable) -> BeamResult<()> {
    derive_linear(table)?;
    derive_stokes(table)
}
