//! treedupe - duplicate file and directory-tree finder.
//!
//! Entry point for the CLI binary.

use clap::Parser;
use treedupe::cli::Cli;
use treedupe::error::ExitCode;
use treedupe::logging;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match treedupe::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    }
}
