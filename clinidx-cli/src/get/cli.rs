use clap::{Command, arg};

pub const GET_CMD: &str = "get";

pub fn create_get_cli() -> Command {
    Command::new(GET_CMD)
        .author("Databio")
        .about("Print the trait associations stored for one variant")
        .arg_required_else_help(true)
        .arg(arg!(-s --store <store> "Association store to read"))
        .arg(arg!(--variant <variant> "Variant as chromosome:start:reference:alternate, e.g. 7:140453136:A:T"))
}
