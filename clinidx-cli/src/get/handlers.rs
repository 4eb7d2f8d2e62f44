use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;

use clinidx_core::VariantKey;
use clinidx_index::store::AssociationStore;

pub fn run_get(matches: &ArgMatches) -> Result<()> {
    let store_path = matches
        .get_one::<String>("store")
        .context("A path to an association store is required.")?;
    let variant = matches
        .get_one::<String>("variant")
        .context("A variant is required.")?;

    let key = VariantKey::try_from(variant.as_str())?;
    let store = AssociationStore::open(Path::new(store_path))
        .with_context(|| format!("Failed to open association store {}", store_path))?;

    let association = store
        .get(&key)?
        .ok_or_else(|| anyhow!("Variant {} not found in {}", key, store_path))?;
    println!("{}", serde_json::to_string_pretty(&association)?);

    Ok(())
}
