//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Prometheus exporter - instrument functions and serve their metrics
#[derive(Parser, Debug)]
#[command(name = "prometheus-exporter")]
#[command(version)]
#[command(about = "Serve Prometheus metrics collected from instrumented functions", long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print a sample configuration file
    Config,
}

impl Cli {
    /// The command to run; `serve` when none is given
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
