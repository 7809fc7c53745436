//! Defines the command-line arguments for the runner.
//!
//! Uses the `clap` crate with its "derive" feature. The single required
//! positional argument is the scan root; clap turns a missing argument
//! into a usage error with a non-zero exit.

use clap::Parser;
use std::path::PathBuf;

/// The runner's argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "tdd_runner",
    version,
    about = "Discover and run marker-opted test files under a directory tree."
)]
pub struct RunnerArgs {
    /// The root directory to scan for test files.
    #[arg(required = true)]
    pub path: PathBuf,
}
