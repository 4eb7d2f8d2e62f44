mod export;
mod get;
mod index;

use anyhow::Result;
use clap::{ArgMatches, Command, arg};
use tracing_subscriber::EnvFilter;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "clinidx";
    pub const BIN_NAME: &str = "clinidx";
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Index clinical variant resources (ClinVar, COSMIC, IARC TP53, DoCM) into a variant-keyed trait association store.")
        .subcommand_required(true)
        .arg(arg!(-v --verbose "Log debug output").global(true))
        .subcommand(index::cli::create_index_cli())
        .subcommand(export::cli::create_export_cli())
        .subcommand(get::cli::create_get_cli())
}

///
/// Install the log subscriber. `RUST_LOG` wins over the default level;
/// `--verbose` wins over both.
///
fn init_logging(matches: &ArgMatches) {
    let filter = if matches.get_flag("verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(consts::DEFAULT_LOG_LEVEL))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_logging(&matches);

    match matches.subcommand() {
        //
        // INDEX
        //
        Some((index::cli::INDEX_CMD, matches)) => {
            index::handlers::run_index(matches)?;
        }

        //
        // EXPORT
        //
        Some((export::cli::EXPORT_CMD, matches)) => {
            export::handlers::run_export(matches)?;
        }

        //
        // GET
        //
        Some((get::cli::GET_CMD, matches)) => {
            get::handlers::run_get(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_index_overrides_parse() {
        let matches = build_parser()
            .try_get_matches_from([
                "clinidx", "index", "--config", "run.toml", "--assembly", "GRCh38", "--verbose",
            ])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, index::cli::INDEX_CMD);
        assert_eq!(sub.get_one::<String>("assembly").map(String::as_str), Some("GRCh38"));
        assert_eq!(sub.get_one::<String>("store"), None);
    }

    #[rstest]
    fn test_get_requires_variant() {
        let result = build_parser().try_get_matches_from(["clinidx", "get", "--store", "a.db"]);
        assert!(result.is_err());
    }
}
