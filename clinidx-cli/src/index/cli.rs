use clap::{Command, arg};

pub const INDEX_CMD: &str = "index";

pub fn create_index_cli() -> Command {
    Command::new(INDEX_CMD)
        .author("Databio")
        .about("Index every source configured in a TOML run file into the association store")
        .arg_required_else_help(true)
        .arg(arg!(-c --config <config> "Path to the TOML run configuration"))
        .arg(arg!(-s --store [store] "Association store path (overrides the config)"))
        .arg(arg!(-a --assembly [assembly] "Genome assembly, GRCh37 or GRCh38 (overrides the config)"))
}
