use beamcmp_core::{
    align::align, run_comparison, BeamError, Channel, ChannelSelection, Column, Config, CropBasis,
    CropKind, DataTarget, DiffMode, GroupKey, IndependentVariable, NormMode, SampleTable,
};
use chrono::{NaiveDate, NaiveDateTime};
use num_complex::Complex64;

fn t(sec: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 3, 5)
        .unwrap()
        .and_hms_opt(13, 0, sec)
        .unwrap()
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn model_table(keys: &[(u32, f64)], j11: Vec<Complex64>, j22: Vec<Complex64>) -> SampleTable {
    let n = keys.len();
    let zeros = vec![c(0.0, 0.0); n];
    SampleTable::new(
        keys.iter().map(|(s, _)| t(*s)).collect(),
        keys.iter().map(|(_, f)| *f).collect(),
    )
    .unwrap()
    .with_column("J11", Column::Complex(j11))
    .unwrap()
    .with_column("J12", Column::Complex(zeros.clone()))
    .unwrap()
    .with_column("J21", Column::Complex(zeros))
    .unwrap()
    .with_column("J22", Column::Complex(j22))
    .unwrap()
}

fn scope_table(keys: &[(u32, f64)], xx: Vec<f64>, xy: Vec<Complex64>, yy: Vec<f64>) -> SampleTable {
    SampleTable::new(
        keys.iter().map(|(s, _)| t(*s)).collect(),
        keys.iter().map(|(_, f)| *f).collect(),
    )
    .unwrap()
    .with_column("xx", Column::Real(xx))
    .unwrap()
    .with_column("xy", Column::Complex(xy))
    .unwrap()
    .with_column("yy", Column::Real(yy))
    .unwrap()
}

fn raw_config() -> Config {
    let mut config = Config::default();
    config.crop.basis = CropBasis::None;
    config.normalization.mode = NormMode::None;
    config
}

#[test]
fn identity_beam_matches_unit_scope() {
    let model = model_table(&[(0, 100.0)], vec![c(1.0, 0.0)], vec![c(1.0, 0.0)]);
    let scope = scope_table(&[(0, 100.0)], vec![1.0], vec![c(0.0, 0.0)], vec![1.0]);

    let output = run_comparison(model, scope, &raw_config()).unwrap();
    let merged = &output.merged;
    assert_eq!(merged.height(), 1);
    assert_eq!(merged.real("xx_model").unwrap(), &[1.0]);
    assert_eq!(merged.real("xx_scope").unwrap(), &[1.0]);
    assert_eq!(merged.real("xx_diff").unwrap(), &[0.0]);
    assert_eq!(merged.real("I_diff").unwrap(), &[0.0]);
    assert_eq!(merged.real("d_Time").unwrap(), &[0.0]);
}

#[test]
fn disjoint_keys_halt_with_no_overlap() {
    let model = model_table(&[(0, 100.0)], vec![c(1.0, 0.0)], vec![c(1.0, 0.0)]);
    let scope = scope_table(&[(1, 100.0)], vec![1.0], vec![c(0.5, 0.0)], vec![1.0]);
    let err = run_comparison(model, scope, &raw_config()).unwrap_err();
    assert!(matches!(err, BeamError::NoOverlap { .. }));
    assert!(err.is_fatal());
}

#[test]
fn empty_scope_with_per_frequency_crop_reports_no_overlap() {
    let model = model_table(&[(0, 100.0)], vec![c(1.0, 0.0)], vec![c(1.0, 0.0)]);
    let scope = scope_table(&[], Vec::new(), Vec::new(), Vec::new());
    let mut config = raw_config();
    config.crop.basis = CropBasis::PerFrequency;
    config.crop.target = DataTarget::Scope;
    let err = run_comparison(model, scope, &config).unwrap_err();
    assert!(
        matches!(err, BeamError::NoOverlap { scope_rows: 0, .. }),
        "{err:?}"
    );
}

#[test]
fn time_offset_aligns_skewed_scope() {
    let model = model_table(&[(0, 100.0)], vec![c(1.0, 0.0)], vec![c(1.0, 0.0)]);
    let scope = scope_table(&[(3, 100.0)], vec![1.0], vec![c(0.5, 0.0)], vec![1.0]);
    let mut config = raw_config();
    config.alignment.time_offset_secs = 3;
    let output = run_comparison(model, scope, &config).unwrap();
    assert_eq!(output.merged.time(), &[t(0)]);
}

#[test]
fn merge_cardinality_with_duplicates() {
    let model = model_table(
        &[(0, 100.0), (0, 100.0), (1, 100.0), (2, 100.0)],
        vec![c(1.0, 0.0); 4],
        vec![c(1.0, 0.0); 4],
    );
    let scope = scope_table(
        &[(0, 100.0), (0, 100.0), (0, 100.0), (1, 100.0), (5, 100.0)],
        vec![1.0; 5],
        vec![c(0.1, 0.0); 5],
        vec![1.0; 5],
    );
    let mut model = model;
    beamcmp_core::channel::derive_channels(&mut model).unwrap();
    let merged = align(&model, &scope).unwrap();
    // key t0: 2 x 3, key t1: 1 x 1, others unmatched
    assert_eq!(merged.height(), 7);
}

#[test]
fn normalization_feeds_stokes_and_subtract_round_trips() {
    let keys = [(0, 100.0), (1, 100.0), (0, 200.0), (1, 200.0)];
    let model = model_table(
        &keys,
        vec![c(1.0, 0.0), c(2.0, 0.0), c(1.0, 1.0), c(0.5, 0.0)],
        vec![c(1.0, 0.0), c(1.0, 0.0), c(2.0, 0.0), c(1.0, 0.0)],
    );
    let scope = scope_table(
        &keys,
        vec![2.0, 8.0, 4.0, 1.0],
        vec![c(0.2, 0.1), c(0.4, -0.1), c(0.3, 0.3), c(0.1, 0.0)],
        vec![1.0, 2.0, 4.0, 0.5],
    );
    let mut config = raw_config();
    config.normalization.mode = NormMode::Overall;
    config.normalization.target = DataTarget::Both;

    let output = run_comparison(model, scope, &config).unwrap();
    let merged = &output.merged;

    let xx = merged.real("xx_scope").unwrap();
    let yy = merged.real("yy_scope").unwrap();
    let i = merged.real("I_scope").unwrap();
    assert_eq!(xx.iter().cloned().fold(0.0, f64::max), 1.0);
    for row in 0..merged.height() {
        assert!((i[row] - (xx[row] + yy[row])).abs() < 1e-12);
    }

    for channel in [Channel::Xx, Channel::Yy, Channel::I, Channel::Q, Channel::U] {
        let model = merged.real(&channel.model_column()).unwrap();
        let scope = merged.real(&channel.scope_column()).unwrap();
        let diff = merged.real(&channel.diff_column()).unwrap();
        for row in 0..merged.height() {
            assert!((model[row] - diff[row] - scope[row]).abs() < 1e-12);
        }
    }
    assert!(matches!(
        merged.column("xy_diff"),
        Some(Column::Complex(_))
    ));
}

#[test]
fn series_are_ascending_per_variable() {
    let keys = [
        (2, 300.0),
        (0, 100.0),
        (1, 200.0),
        (0, 300.0),
        (2, 100.0),
        (1, 100.0),
    ];
    let model = model_table(
        &keys,
        (1..=6).map(|k| c(k as f64, 0.0)).collect(),
        vec![c(1.0, 0.0); 6],
    );
    let scope = scope_table(
        &keys,
        (1..=6).map(|k| k as f64 * 1.1).collect(),
        vec![c(0.1, 0.0); 6],
        vec![1.0; 6],
    );
    let output = run_comparison(model, scope, &raw_config()).unwrap();
    assert_eq!(output.series.len(), 2);

    let by_time = &output.series[0];
    assert_eq!(by_time.variable, IndependentVariable::Time);
    let times: Vec<GroupKey> = by_time.keys().collect();
    assert_eq!(
        times,
        vec![GroupKey::Time(t(0)), GroupKey::Time(t(1)), GroupKey::Time(t(2))]
    );

    let by_freq = &output.series[1];
    let freqs: Vec<GroupKey> = by_freq.keys().collect();
    assert_eq!(
        freqs,
        vec![
            GroupKey::Freq(100.0),
            GroupKey::Freq(200.0),
            GroupKey::Freq(300.0)
        ]
    );
    // Freq 200 has a single sample: reported, not fatal.
    assert!(by_freq.failures.iter().all(|f| !f.is_fatal()));
    assert_eq!(by_freq.failures.len(), Channel::ALL.len());
    assert!(output.failures().count() >= by_freq.failures.len());
}

#[test]
fn scope_crop_removes_zeros_before_merge() {
    let keys = [(0, 100.0), (1, 100.0), (2, 100.0), (3, 100.0), (4, 100.0)];
    let model = model_table(&keys, vec![c(1.0, 0.0); 5], vec![c(1.0, 0.0); 5]);
    let scope = scope_table(
        &keys,
        vec![1.0, 2.0, 0.0, 3.0, 400.0],
        vec![c(0.1, 0.0); 5],
        vec![1.0; 5],
    );
    let mut config = raw_config();
    config.crop.basis = CropBasis::Overall;
    config.crop.kind = CropKind::Percentile;
    config.crop.raw_magnitude = 50.0;

    let output = run_comparison(model, scope, &config).unwrap();
    let xx = output.merged.real("xx_scope").unwrap();
    assert!(xx.iter().all(|v| *v != 0.0));
    // after zero removal: [1, 2, 3, 400] -> 50th percentile 2.5
    assert_eq!(xx, &[1.0, 2.0]);
}

#[test]
fn each_channel_gets_its_own_series() {
    let model = model_table(
        &[(0, 100.0), (1, 100.0)],
        vec![c(1.0, 0.0), c(2.0, 0.0)],
        vec![c(1.0, 0.0); 2],
    );
    let scope = scope_table(
        &[(0, 100.0), (1, 100.0)],
        vec![1.0, 3.0],
        vec![c(0.1, 0.0); 2],
        vec![1.0; 2],
    );
    let mut config = raw_config();
    config.selection.channels = ChannelSelection::from_tokens(&["xx", "Q"]).unwrap();
    config.selection.each = true;
    config.selection.independent_vars = vec![IndependentVariable::Freq];
    config.difference.mode = DiffMode::Divide;

    let output = run_comparison(model, scope, &config).unwrap();
    assert_eq!(output.series.len(), 2);
    assert_eq!(output.series[0].channels, vec![Channel::Xx]);
    assert_eq!(output.series[1].channels, vec![Channel::Q]);
    assert!(!output.merged.has_column("yy_diff"));
    let xx_diff = output.merged.real("xx_diff").unwrap();
    assert!((xx_diff[1] - 4.0 / 3.0).abs() < 1e-12);
}

#[test]
fn invalid_percentile_is_rejected_before_work() {
    let model = model_table(&[(0, 100.0)], vec![c(1.0, 0.0)], vec![c(1.0, 0.0)]);
    let scope = scope_table(&[(0, 100.0)], vec![1.0], vec![c(0.5, 0.0)], vec![1.0]);
    let mut config = raw_config();
    config.crop.kind = CropKind::Percentile;
    config.crop.raw_magnitude = 100.0;
    assert!(matches!(
        run_comparison(model, scope, &config),
        Err(BeamError::Config { .. })
    ));
}

#[test]
fn frequency_filter_restricts_merged_rows() {
    let keys = [(0, 100.0), (0, 200.0)];
    let model = model_table(&keys, vec![c(1.0, 0.0); 2], vec![c(1.0, 0.0); 2]);
    let scope = scope_table(&keys, vec![1.0; 2], vec![c(0.1, 0.0); 2], vec![1.0; 2]);
    let mut config = raw_config();
    config.selection.freq_filter = vec![200.0];
    let output = run_comparison(model, scope, &config).unwrap();
    assert_eq!(output.merged.freq(), &[200.0]);
}
