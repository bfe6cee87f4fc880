//! Partially persistent graph CLI tool.

use clap::Parser as _;

use fatgraph_cli::CliArgs;

fn main() {
    if let Err(err) = CliArgs::parse().run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
