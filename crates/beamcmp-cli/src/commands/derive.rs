use std::path::Path;

use anyhow::{Context, Result};
use beamcmp_core::channel::derive_channels;
use beamcmp_io::{read_sample_table, write_table};
use tracing::info;

pub fn handle(input: &Path, out: &Path) -> Result<()> {
    info!("Deriving channels for {}", input.display());
    let mut table = read_sample_table(input)?;
    derive_channels(&mut table)
        .with_context(|| format!("deriving channels for {}", input.display()))?;
    write_table(&table, out)?;
    println!("Wrote {} rows to {}", table.height(), out.display());
    Ok(())
}
