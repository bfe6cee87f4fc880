//! Command line tools for exploring persistent graphs, used by the `fatgraph`
//! binary.

use std::io::Write;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use clio::Output;
use fatgraph::{GraphConfig, PersistenceError, RootBackFill};
use thiserror::Error;

pub mod demo;
pub mod run;
pub mod script;

use script::Report;

/// CLI arguments.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Partially persistent graph tools.")]
#[non_exhaustive]
pub enum CliArgs {
    /// Run the built-in demonstration scenario.
    Demo(demo::DemoArgs),
    /// Run a JSON script of graph operations.
    Run(run::RunArgs),
}

impl CliArgs {
    /// Run the selected subcommand.
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            CliArgs::Demo(mut args) => args.run(),
            CliArgs::Run(mut args) => args.run(),
        }
    }
}

/// Error type for the CLI.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    /// Error reading input or writing output.
    #[error("Error reading input or writing output: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing a script or serializing a report.
    #[error("Error parsing input: {0}")]
    Parse(#[from] serde_json::Error),
    /// A script operation was rejected while running with `--fail-fast`.
    #[error("Step {step} failed: {source}")]
    StepFailed {
        /// Index of the failing operation in the script.
        step: usize,
        /// The error returned by the graph.
        #[source]
        source: PersistenceError,
    },
}

/// Overrides for the graph configuration.
#[derive(Debug, Default, clap::Args)]
pub struct GraphArgs {
    /// Number of out-edge slots of every node.
    #[arg(long, help_heading = "Graph")]
    pub out_degree: Option<usize>,
    /// Bound on the in-degree of nodes. Logs hold twice as many entries.
    #[arg(long, help_heading = "Graph")]
    pub in_degree: Option<usize>,
    /// Never back-fill the roots of older versions.
    #[arg(long, help_heading = "Graph")]
    pub strict_roots: bool,
}

impl GraphArgs {
    /// Apply the overrides to `config`.
    pub fn apply(&self, mut config: GraphConfig) -> GraphConfig {
        if let Some(out_degree) = self.out_degree {
            config.out_degree_bound = out_degree;
        }
        if let Some(in_degree) = self.in_degree {
            config.in_degree_bound = in_degree;
        }
        if self.strict_roots {
            config.root_back_fill = RootBackFill::Strict;
        }
        config
    }
}

/// Where and how reports are written.
#[derive(Debug, clap::Args)]
pub struct OutputArgs {
    /// Output file. Defaults to `-` for stdout.
    #[arg(short, long, value_parser, default_value = "-", help_heading = "Output")]
    pub output: Output,
    /// Pretty-print the JSON report.
    #[arg(long, help_heading = "Output")]
    pub pretty: bool,
    /// Verbosity.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,
}

impl OutputArgs {
    /// Install a subscriber printing tracing events to stderr, filtered by
    /// the verbosity flags.
    pub fn init_tracing(&self) {
        // Ignore the error if a subscriber is already installed.
        let _ = tracing_subscriber::fmt()
            .with_max_level(self.verbose.tracing_level_filter())
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Write `report` as JSON.
    pub fn write_report(&mut self, report: &Report) -> Result<(), CliError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.output, report)?;
        } else {
            serde_json::to_writer(&mut self.output, report)?;
        }
        writeln!(self.output)?;
        Ok(())
    }
}
