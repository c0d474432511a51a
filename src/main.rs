//! `postagger-train` entrypoint.
//!
//! Parses the arguments, runs the training pipeline and exits with status 1
//! for configuration errors and 2 for I/O errors.

use clap::Parser;

mod cli;

fn main() {
    let args = cli::CliArgs::parse();
    if let Err(err) = cli::run(args) {
        eprintln!("{}", err);
        std::process::exit(err.exit_code());
    }
}
