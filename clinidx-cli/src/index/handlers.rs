use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use clinidx_index::config::{Assembly, IndexerConfig};
use clinidx_index::pipeline;

pub fn run_index(matches: &ArgMatches) -> Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .context("A path to a run configuration is required.")?;

    let mut config = IndexerConfig::try_from(Path::new(config_path))
        .with_context(|| format!("Failed to load configuration {}", config_path))?;

    if let Some(store) = matches.get_one::<String>("store") {
        config.store = PathBuf::from(store);
    }
    if let Some(assembly) = matches.get_one::<String>("assembly") {
        config.assembly = assembly.parse::<Assembly>()?;
    }

    let report = pipeline::run(&config)?;
    for (source, stats) in &report.sources {
        info!(
            "{}: {} of {} records indexed ({} new variants, {} updates)",
            source,
            stats.indexed_records,
            stats.total_records,
            stats.new_variants,
            stats.updated_variants
        );
    }
    if let Some(exported) = report.exported {
        info!("{} associations exported", exported);
    }

    Ok(())
}
