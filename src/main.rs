//! ttbuild CLI entry point
//!
//! Parses arguments, runs the command and maps the outcome to an exit code:
//! 0 when every template succeeded, 1 when any template failed or the run
//! could not start.

use clap::Parser;
use ttbuild::cli::Cli;
use ttbuild::core::user_friendly_error;

fn main() {
    let cli = Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
