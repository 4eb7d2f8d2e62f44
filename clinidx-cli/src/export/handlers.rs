use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use clinidx_index::store::AssociationStore;

pub fn run_export(matches: &ArgMatches) -> Result<()> {
    let store_path = matches
        .get_one::<String>("store")
        .context("A path to an association store is required.")?;
    let output = matches
        .get_one::<String>("output")
        .context("An output path is required.")?;

    let store = AssociationStore::open(Path::new(store_path))
        .with_context(|| format!("Failed to open association store {}", store_path))?;
    let written = store.export(Path::new(output))?;
    info!("Wrote {} associations to {}", written, output);

    Ok(())
}
