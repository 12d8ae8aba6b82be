use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beamcmp_cli::{cli::CompareArgs, config, manifest};
use beamcmp_core::{run_comparison, ComparisonOutput, Config};
use beamcmp_io::{read_sample_table, write_fom, write_overall, write_table};
use tabwriter::TabWriter;
use tracing::{info, warn};

use crate::commands::util::series_stem;

pub fn handle(args: &CompareArgs) -> Result<()> {
    let config = config::resolve(args)?;
    info!(
        "Comparing {} against {}",
        args.model.display(),
        args.scope.display()
    );

    let model = read_sample_table(&args.model)?;
    let scope = read_sample_table(&args.scope)?;
    let output = run_comparison(model, scope, &config)?;

    let failures = output.failures().count();
    if failures > 0 {
        warn!(failures, "some groups had too few samples for a correlation");
    }
    print_summary(&config, &output)?;

    if let Some(dir) = &args.out_dir {
        let outputs = write_outputs(dir, &config, &output)?;
        let output_refs: Vec<&Path> = outputs.iter().map(PathBuf::as_path).collect();
        let manifest = manifest::record_manifest(
            dir,
            "compare",
            &[args.model.as_path(), args.scope.as_path()],
            &output_refs,
            &manifest::config_params(&config),
        )?;
        println!("Recorded run manifest {}", manifest.display());
    }
    Ok(())
}

fn write_outputs(dir: &Path, config: &Config, output: &ComparisonOutput) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let merged = dir.join("merged.csv");
    write_table(&output.merged, &merged).context("exporting merged table")?;
    written.push(merged);

    let overall = dir.join("overall.csv");
    write_overall(
        config.selection.channels.channels(),
        &output.overall,
        &overall,
    )
    .context("exporting overall figures")?;
    written.push(overall);

    for series in &output.series {
        let stem = series_stem(
            &series.variable.to_string(),
            &series.channels,
            config.selection.each,
        );
        let path = dir.join(format!("{stem}.csv"));
        write_fom(series, &path).with_context(|| format!("exporting {stem}"))?;
        written.push(path);
    }
    Ok(written)
}

fn fmt_figure(value: Option<&f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => "-".to_string(),
    }
}

fn print_summary(config: &Config, output: &ComparisonOutput) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "Merged rows: {}  diff: {}  non-finite: {}",
        output.merged.height(),
        config.difference.mode,
        output.non_finite_diffs
    )?;
    writeln!(writer, "CHANNEL\tRMSE\tCORRELATION")?;
    for channel in config.selection.channels.channels() {
        writeln!(
            writer,
            "{}\t{}\t{}",
            channel,
            fmt_figure(output.overall.rmse.get(channel)),
            fmt_figure(output.overall.correlation.get(channel))
        )?;
    }
    writer.flush()?;
    Ok(())
}
