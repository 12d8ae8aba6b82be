//! Column-oriented sample tables keyed by `(Time, Freq)`.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use chrono::NaiveDateTime;
use num_complex::Complex64;

use crate::config::IndependentVariable;
use crate::error::{BeamError, BeamResult};

pub const TIME: &str = "Time";
pub const FREQ: &str = "Freq";
pub const ELAPSED: &str = "d_Time";

/// Columns never cropped, normalized or suffixed.
pub const KEY_COLUMNS: [&str; 3] = [TIME, FREQ, ELAPSED];

pub fn is_key_column(name: &str) -> bool {
    KEY_COLUMNS.contains(&name)
}

/// A single named value column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Real(v) => v.len(),
            Column::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Column::Complex(_))
    }

    /// Absolute value of row `i`.
    pub fn magnitude(&self, i: usize) -> f64 {
        match self {
            Column::Real(v) => v[i].abs(),
            Column::Complex(v) => v[i].norm(),
        }
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.magnitude(i)).collect()
    }

    /// Values as used in statistics: reals as-is, complex values by modulus.
    pub fn plottable(&self) -> Vec<f64> {
        match self {
            Column::Real(v) => v.clone(),
            Column::Complex(v) => v.iter().map(|c| c.norm()).collect(),
        }
    }

    pub fn is_zero(&self, i: usize) -> bool {
        match self {
            Column::Real(v) => v[i] == 0.0,
            Column::Complex(v) => v[i].re == 0.0 && v[i].im == 0.0,
        }
    }

    pub fn to_complex(&self) -> Vec<Complex64> {
        match self {
            Column::Real(v) => v.iter().map(|&x| Complex64::new(x, 0.0)).collect(),
            Column::Complex(v) => v.clone(),
        }
    }

    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Real(v) => Column::Real(rows.iter().map(|&i| v[i]).collect()),
            Column::Complex(v) => Column::Complex(rows.iter().map(|&i| v[i]).collect()),
        }
    }

    fn append(&mut self, other: &Column) -> bool {
        match (self, other) {
            (Column::Real(a), Column::Real(b)) => a.extend_from_slice(b),
            (Column::Complex(a), Column::Complex(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }

    fn type_name(&self) -> &'static str {
        match self {
            Column::Real(_) => "real",
            Column::Complex(_) => "complex",
        }
    }
}

/// Value of the independent variable shared by one partition of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupKey {
    Time(NaiveDateTime),
    Freq(f64),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
            GroupKey::Freq(v) => write!(f, "{v}"),
        }
    }
}

/// Rows sharing one exact value of the independent variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: GroupKey,
    pub rows: Vec<usize>,
}

/// Exact-equality key for frequencies; folds `-0.0` into `0.0`.
pub(crate) fn freq_key(freq: f64) -> u64 {
    if freq == 0.0 {
        0.0f64.to_bits()
    } else {
        freq.to_bits()
    }
}

fn group_rows<K, I>(keys: I) -> Vec<(K, Vec<usize>)>
where
    K: Eq + Hash + Copy,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<usize>)> = Vec::new();
    for (row, key) in keys.into_iter().enumerate() {
        match index.get(&key) {
            Some(&slot) => groups[slot].1.push(row),
            None => {
                index.insert(key, groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    groups
}

/// A table of samples with `Time` and `Freq` key columns and any number of
/// named real or complex value columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    time: Vec<NaiveDateTime>,
    freq: Vec<f64>,
    columns: Vec<(String, Column)>,
}

impl SampleTable {
    pub fn new(time: Vec<NaiveDateTime>, freq: Vec<f64>) -> BeamResult<Self> {
        if time.len() != freq.len() {
            return Err(BeamError::Schema(format!(
                "{TIME} has {} rows but {FREQ} has {}",
                time.len(),
                freq.len()
            )));
        }
        Ok(Self {
            time,
            freq,
            columns: Vec::new(),
        })
    }

    /// Builder-style [`SampleTable::insert_column`].
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> BeamResult<Self> {
        self.insert_column(name, column)?;
        Ok(self)
    }

    pub fn height(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    pub(crate) fn time_mut(&mut self) -> &mut [NaiveDateTime] {
        &mut self.time
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Names of the value columns outside [`KEY_COLUMNS`].
    pub fn value_column_names(&self) -> Vec<String> {
        self.column_names()
            .filter(|name| !is_key_column(name))
            .map(String::from)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, column)| column)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, column)| column)
    }

    pub fn require(&self, name: &str) -> BeamResult<&Column> {
        self.column(name)
            .ok_or_else(|| BeamError::Schema(format!("missing column '{name}'")))
    }

    pub fn real(&self, name: &str) -> BeamResult<&[f64]> {
        match self.require(name)? {
            Column::Real(v) => Ok(v),
            Column::Complex(_) => Err(BeamError::Schema(format!(
                "column '{name}' is complex, expected real"
            ))),
        }
    }

    /// Inserts or replaces a column. The length must match the table height.
    pub fn insert_column(&mut self, name: impl Into<String>, column: Column) -> BeamResult<()> {
        let name = name.into();
        if is_key_column(&name) && name != ELAPSED {
            return Err(BeamError::Schema(format!(
                "'{name}' is a key column and cannot be stored as a value column"
            )));
        }
        if column.len() != self.height() {
            return Err(BeamError::Schema(format!(
                "column '{name}' has {} rows, table has {}",
                column.len(),
                self.height()
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(pos).1)
    }

    /// New table holding `rows` in the given order.
    pub fn take(&self, rows: &[usize]) -> SampleTable {
        SampleTable {
            time: rows.iter().map(|&i| self.time[i]).collect(),
            freq: rows.iter().map(|&i| self.freq[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.take(rows)))
                .collect(),
        }
    }

    /// New table holding the rows where `keep` returns true.
    pub fn filter<F: FnMut(usize) -> bool>(&self, mut keep: F) -> SampleTable {
        let rows: Vec<usize> = (0..self.height()).filter(|&i| keep(i)).collect();
        self.take(&rows)
    }

    /// Keeps the key columns plus the listed value columns that exist.
    pub fn select(&self, names: &[&str]) -> SampleTable {
        SampleTable {
            time: self.time.clone(),
            freq: self.freq.clone(),
            columns: self
                .columns
                .iter()
                .filter(|(name, _)| name == ELAPSED || names.contains(&name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Concatenates tables with identical schemas.
    pub fn vstack(parts: Vec<SampleTable>) -> BeamResult<SampleTable> {
        let mut parts = parts.into_iter();
        let Some(mut out) = parts.next() else {
            return Ok(SampleTable::default());
        };
        for part in parts {
            if part.columns.len() != out.columns.len() {
                return Err(BeamError::Schema(format!(
                    "cannot stack tables with {} and {} columns",
                    out.columns.len(),
                    part.columns.len()
                )));
            }
            out.time.extend_from_slice(&part.time);
            out.freq.extend_from_slice(&part.freq);
            for ((name, column), (other_name, other)) in
                out.columns.iter_mut().zip(part.columns.iter())
            {
                if name != other_name || !column.append(other) {
                    return Err(BeamError::Schema(format!(
                        "cannot stack column '{other_name}' ({}) onto '{name}' ({})",
                        other.type_name(),
                        column.type_name()
                    )));
                }
            }
        }
        Ok(out)
    }

    /// Groups row indices by exact value of `by`, in ascending key order.
    pub fn partition(&self, by: IndependentVariable) -> Vec<Partition> {
        match by {
            IndependentVariable::Time => {
                let mut groups = group_rows(self.time.iter().copied());
                groups.sort_by(|a, b| a.0.cmp(&b.0));
                groups
                    .into_iter()
                    .map(|(t, rows)| Partition {
                        key: GroupKey::Time(t),
                        rows,
                    })
                    .collect()
            }
            IndependentVariable::Freq => {
                let mut groups = group_rows(self.freq.iter().map(|&f| freq_key(f)));
                groups.sort_by(|a, b| f64::from_bits(a.0).total_cmp(&f64::from_bits(b.0)));
                groups
                    .into_iter()
                    .map(|(bits, rows)| Partition {
                        key: GroupKey::Freq(f64::from_bits(bits)),
                        rows,
                    })
                    .collect()
            }
        }
    }
}
