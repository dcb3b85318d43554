use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("verbprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("verbprobe")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Enable debug logging on stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("check")
                .about("Probe URLs with GET, POST, PUT, DELETE, OPTIONS, HEAD and PATCH")
                .arg(
                    arg!([URLS] ...)
                        .help("URLs to probe")
                        .required_unless_present("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to probe")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM>)
                        .required(false)
                        .help("Maximum number of requests in flight")
                        .value_parser(clap::builder::RangedU64ValueParser::<usize>::new().range(1..))
                        .default_value("50"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: json, text, csv, markdown")
                        .value_parser(["json", "text", "csv", "markdown"])
                        .default_value("json"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"save")
                        .required(false)
                        .help("Store the results in the verbprobe database")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Database path (default: ~/.config/verbprobe/verbprobe.db)"),
                ),
        )
        .subcommand(
            command!("init")
                .about("Initializes the verbprobe database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the verbprobe database")
                        .default_value("~/.config/verbprobe/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Forces the overwriting of any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("history")
                .about("List results stored by previous checks")
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Database path (default: ~/.config/verbprobe/verbprobe.db)"),
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Only show the stored result for this URL"),
                ),
        )
}
