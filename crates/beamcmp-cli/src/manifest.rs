use std::{fs, path::Path};

use anyhow::{Context, Result};
use beamcmp_core::Config;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
pub struct ManifestEntry {
    pub run_id: String,
    pub command: String,
    pub version: String,
    pub timestamp: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub params: Vec<Param>,
}

#[derive(Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// The resolved configuration as flat name/value pairs.
pub fn config_params(config: &Config) -> Vec<(String, String)> {
    vec![
        ("norm".into(), config.normalization.mode.to_string()),
        ("norm_data".into(), config.normalization.target.to_string()),
        ("crop_type".into(), config.crop.kind.to_string()),
        ("crop".into(), config.crop.raw_magnitude.to_string()),
        ("crop_basis".into(), config.crop.basis.to_string()),
        ("crop_data".into(), config.crop.target.to_string()),
        ("diff".into(), config.difference.mode.to_string()),
        ("values".into(), join(config.selection.channels.channels())),
        ("each".into(), config.selection.each.to_string()),
        ("by".into(), join(&config.selection.independent_vars)),
        (
            "offset".into(),
            config.alignment.time_offset_secs.to_string(),
        ),
        ("freq".into(), join(&config.selection.freq_filter)),
    ]
}

/// Writes `run-<id>.json` into `dir` and returns its path.
pub fn record_manifest(
    dir: &Path,
    command: &str,
    inputs: &[&Path],
    outputs: &[&Path],
    params: &[(String, String)],
) -> Result<std::path::PathBuf> {
    let run_id = Uuid::new_v4().to_string();
    fs::create_dir_all(dir)?;
    let manifest = ManifestEntry {
        run_id: run_id.clone(),
        command: command.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        inputs: inputs.iter().map(|p| p.display().to_string()).collect(),
        outputs: outputs.iter().map(|p| p.display().to_string()).collect(),
        params: params
            .iter()
            .map(|(k, v)| Param {
                name: k.clone(),
                value: v.clone(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    let path = dir.join(format!("run-{}.json", run_id));
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn read_manifest(path: &Path) -> Result<ManifestEntry> {
    let json = fs::read_to_string(path)?;
    let manifest = serde_json::from_str(&json)?;
    Ok(manifest)
}
