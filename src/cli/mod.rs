//! The attest command-line interface.
//!
//! Orchestrates one run: parse arguments, print the start banner, scan the
//! tree, print the finish banner. A `Failure` raised during a batch never
//! reaches this layer (the execution wrapper prints and swallows it); any
//! `Fatal` surfaces here as a miette diagnostic and a non-zero exit.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use chrono::Local;
use clap::Parser;

use crate::cli::args::RunnerArgs;
use crate::cli::output::{OutputSink, StdoutSink};
use crate::discovery::Scanner;
use crate::errors::Fatal;
use crate::selftest;

pub mod args;
pub mod output;

// Color constants for terminal output
const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";

/// Configuration for one runner invocation.
#[derive(Debug)]
pub struct RunConfig {
    /// The scan root as given on the command line (resolved by the scanner).
    pub root: PathBuf,
    pub use_colors: bool,
}

impl RunConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }

    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

/// The main entry point for the CLI.
pub fn run() {
    let args = RunnerArgs::parse();
    let config = RunConfig::new(args.path);

    if let Err(error) = execute(&config) {
        eprintln!(
            "{}: {:?}",
            config.colorize("Error", RED),
            miette::Report::new(error)
        );
        process::exit(1);
    }
}

/// Runs one scan with banners, against stdout.
pub fn execute(config: &RunConfig) -> Result<(), Fatal> {
    execute_to(&mut StdoutSink, config)
}

/// Runs one scan with banners, against an arbitrary sink.
pub fn execute_to(sink: &mut dyn OutputSink, config: &RunConfig) -> Result<(), Fatal> {
    let clock = Instant::now();
    sink.emit(&format!(
        "\nStarted: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    let mut scanner = Scanner::new(&config.root)?;
    sink.emit(&format!("rootPath: {}\n", scanner.root().display()));

    selftest::register_default_units();
    scanner.run(sink)?;

    sink.emit(&format!(
        "\nFinished: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    sink.emit(&format!("Duration: {} seconds\n", clock.elapsed().as_secs()));
    Ok(())
}
