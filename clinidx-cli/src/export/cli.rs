use clap::{Command, arg};

pub const EXPORT_CMD: &str = "export";

pub fn create_export_cli() -> Command {
    Command::new(EXPORT_CMD)
        .author("Databio")
        .about("Write the association store as JSON lines (gzip when the output ends in .gz)")
        .arg_required_else_help(true)
        .arg(arg!(-s --store <store> "Association store to read"))
        .arg(arg!(-o --output <output> "Output file"))
}
