//! Inner join of model and scope tables on exact `(Time, Freq)` keys.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info};

use crate::config::Source;
use crate::error::{BeamError, BeamResult};
use crate::table::{freq_key, Column, SampleTable, ELAPSED};

type JoinKey = (NaiveDateTime, u64);

/// Shifts every timestamp back by `offset_secs` seconds.
///
/// Used on the scope table when its clock runs ahead of the model.
pub fn apply_time_offset(table: &mut SampleTable, offset_secs: i64) {
    if offset_secs == 0 {
        return;
    }
    let offset = Duration::seconds(offset_secs);
    for t in table.time_mut() {
        *t -= offset;
    }
    debug!(offset_secs, "applied time offset");
}

/// Adds `d_Time`, the elapsed seconds since the earliest `Time`, unless the
/// table already carries it.
pub fn add_elapsed_time(table: &mut SampleTable) -> BeamResult<()> {
    if table.has_column(ELAPSED) {
        return Ok(());
    }
    let Some(start) = table.time().iter().min().copied() else {
        return table.insert_column(ELAPSED, Column::Real(Vec::new()));
    };
    let elapsed = table
        .time()
        .iter()
        .map(|t| {
            let delta = t.signed_duration_since(start);
            delta
                .num_nanoseconds()
                .map(|ns| ns as f64 / 1e9)
                .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1e3)
        })
        .collect();
    table.insert_column(ELAPSED, Column::Real(elapsed))
}

/// Joins `model` and `scope` on exact `(Time, Freq)` equality.
///
/// Value columns are suffixed `_model` / `_scope`. Duplicate keys yield the
/// cross product of their matches. Rows follow the model's order, then the
/// scope's order within a key. An empty result is [`BeamError::NoOverlap`].
pub fn align(model: &SampleTable, scope: &SampleTable) -> BeamResult<SampleTable> {
    let mut scope_index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
    for (row, (t, f)) in scope.time().iter().zip(scope.freq()).enumerate() {
        scope_index.entry((*t, freq_key(*f))).or_default().push(row);
    }

    let mut left = Vec::new();
    let mut right = Vec::new();
    for (row, (t, f)) in model.time().iter().zip(model.freq()).enumerate() {
        if let Some(matches) = scope_index.get(&(*t, freq_key(*f))) {
            for &other in matches {
                left.push(row);
                right.push(other);
            }
        }
    }

    if left.is_empty() {
        return Err(BeamError::NoOverlap {
            model_rows: model.height(),
            scope_rows: scope.height(),
        });
    }

    let mut merged = SampleTable::new(
        left.iter().map(|&i| model.time()[i]).collect(),
        left.iter().map(|&i| model.freq()[i]).collect(),
    )?;
    for (source, table, rows) in [
        (Source::Model, model, &left),
        (Source::Scope, scope, &right),
    ] {
        for name in table.value_column_names() {
            let column = table.require(&name)?.take(rows);
            merged.insert_column(format!("{name}{}", source.suffix()), column)?;
        }
    }
    add_elapsed_time(&mut merged)?;

    info!(
        model_rows = model.height(),
        scope_rows = scope.height(),
        merged_rows = merged.height(),
        "aligned model and scope"
    );
    Ok(merged)
}

/// Keeps only rows whose `Freq` equals one of `freqs`. An empty list keeps
/// everything; a filter that matches nothing is [`BeamError::NoOverlap`].
pub fn filter_frequencies(table: &SampleTable, freqs: &[f64]) -> BeamResult<SampleTable> {
    if freqs.is_empty() {
        return Ok(table.clone());
    }
    let wanted: Vec<u64> = freqs.iter().map(|&f| freq_key(f)).collect();
    let filtered = table.filter(|i| wanted.contains(&freq_key(table.freq()[i])));
    if filtered.is_empty() {
        return Err(BeamError::NoOverlap {
            model_rows: table.height(),
            scope_rows: 0,
        });
    }
    debug!(
        kept = filtered.height(),
        dropped = table.height() - filtered.height(),
        "applied frequency filter"
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, 5)
            .unwrap()
            .and_hms_opt(13, 0, sec)
            .unwrap()
    }

    fn source(keys: &[(u32, f64)], xx: Vec<f64>) -> SampleTable {
        SampleTable::new(
            keys.iter().map(|(s, _)| t(*s)).collect(),
            keys.iter().map(|(_, f)| *f).collect(),
        )
        .unwrap()
        .with_column("xx", Column::Real(xx))
        .unwrap()
    }

    #[test]
    fn unique_keys_give_intersection() {
        let model = source(&[(0, 100.0), (1, 100.0), (2, 100.0)], vec![1.0, 2.0, 3.0]);
        let scope = source(&[(1, 100.0), (2, 100.0), (3, 100.0)], vec![4.0, 5.0, 6.0]);
        let merged = align(&model, &scope).unwrap();
        assert_eq!(merged.height(), 2);
        assert_eq!(merged.real("xx_model").unwrap(), &[2.0, 3.0]);
        assert_eq!(merged.real("xx_scope").unwrap(), &[4.0, 5.0]);
        assert_eq!(merged.real(ELAPSED).unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn duplicate_keys_cross_multiply() {
        let model = source(&[(0, 100.0), (0, 100.0), (1, 100.0)], vec![1.0, 2.0, 3.0]);
        let scope = source(
            &[(0, 100.0), (0, 100.0), (0, 100.0), (1, 100.0)],
            vec![4.0, 5.0, 6.0, 7.0],
        );
        let merged = align(&model, &scope).unwrap();
        assert_eq!(merged.height(), 2 * 3 + 1);
        assert_eq!(
            merged.real("xx_scope").unwrap(),
            &[4.0, 5.0, 6.0, 4.0, 5.0, 6.0, 7.0]
        );
    }

    #[test]
    fn frequency_is_part_of_the_key() {
        let model = source(&[(0, 100.0)], vec![1.0]);
        let scope = source(&[(0, 100.5)], vec![1.0]);
        assert!(matches!(
            align(&model, &scope),
            Err(BeamError::NoOverlap {
                model_rows: 1,
                scope_rows: 1
            })
        ));
    }

    #[test]
    fn offset_moves_scope_onto_model_clock() {
        let model = source(&[(0, 100.0)], vec![1.0]);
        let mut scope = source(&[(5, 100.0)], vec![2.0]);
        assert!(align(&model, &scope).is_err());
        apply_time_offset(&mut scope, 5);
        let merged = align(&model, &scope).unwrap();
        assert_eq!(merged.height(), 1);
    }

    #[test]
    fn elapsed_time_is_not_overwritten() {
        let mut table = source(&[(3, 1.0)], vec![1.0])
            .with_column(ELAPSED, Column::Real(vec![42.0]))
            .unwrap();
        add_elapsed_time(&mut table).unwrap();
        assert_eq!(table.real(ELAPSED).unwrap(), &[42.0]);
    }

    #[test]
    fn frequency_filter_keeps_exact_matches() {
        let table = source(&[(0, 100.0), (0, 200.0), (1, 100.0)], vec![1.0, 2.0, 3.0]);
        let kept = filter_frequencies(&table, &[100.0]).unwrap();
        assert_eq!(kept.real("xx").unwrap(), &[1.0, 3.0]);
        assert!(filter_frequencies(&table, &[300.0]).is_err());
        assert_eq!(filter_frequencies(&table, &[]).unwrap(), table);
    }
}
