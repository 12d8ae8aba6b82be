//! Text encodings of individual cells.

use beamcmp_core::{BeamError, BeamResult};
use chrono::NaiveDateTime;
use num_complex::Complex64;

/// Format used for every exported instant.
pub const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const INSTANT_FORMATS: [&str; 2] = [INSTANT_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"];

fn bad_cell(column: &str, row: usize, text: &str, expected: &str) -> BeamError {
    BeamError::Schema(format!(
        "column '{column}' row {row}: cannot parse '{text}' as {expected}"
    ))
}

pub fn parse_instant(text: &str, column: &str, row: usize) -> BeamResult<NaiveDateTime> {
    let text = text.trim();
    INSTANT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| bad_cell(column, row, text, "an instant"))
}

pub fn parse_real(text: &str, column: &str, row: usize) -> BeamResult<f64> {
    let text = text.trim();
    text.parse::<f64>()
        .map_err(|_| bad_cell(column, row, text, "a real number"))
}

/// Whether `text` carries an imaginary part, e.g. `(1+0j)` or `2-1i`.
pub fn looks_complex(text: &str) -> bool {
    let text = text.trim();
    text.starts_with('(') || text.ends_with('j') || text.ends_with('i')
}

/// Accepts `(1+0j)`, `1+0j`, `1+0i`, `-2j` and plain reals.
pub fn parse_complex(text: &str, column: &str, row: usize) -> BeamResult<Complex64> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed)
        .trim();
    // num-complex spells the imaginary unit `i`
    let normalized = match inner.strip_suffix('j') {
        Some(body) => format!("{body}i"),
        None => inner.to_string(),
    };
    normalized
        .parse::<Complex64>()
        .map_err(|_| bad_cell(column, row, trimmed, "a complex number"))
}

pub fn format_complex(value: Complex64) -> String {
    let sign = if value.im.is_sign_negative() { '-' } else { '+' };
    format!("({}{sign}{}j)", value.re, value.im.abs())
}

pub fn format_instant(value: &NaiveDateTime) -> String {
    value.format(INSTANT_FORMAT).to_string()
}
