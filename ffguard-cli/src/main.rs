// ffguard-cli/src/main.rs
//
// Entry point for the `ffguard` binary.
//
// Parses the command line, installs the logger, runs the selected subcommand
// and turns any error into a red message on stderr and exit status 1.

use clap::Parser;
use console::style;
use ffguard_cli::logging::init_logging;
use ffguard_cli::{run, Cli};
use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").for_stderr().red().bold(), style(&e).for_stderr().red());
        process::exit(1);
    }
}
