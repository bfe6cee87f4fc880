//! The `run` subcommand.

use clap::Parser;
use clio::Input;

use crate::script::Script;
use crate::{CliError, GraphArgs, OutputArgs};

/// Run a script of graph operations and print a JSON report.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Run a JSON script of graph operations.")]
#[non_exhaustive]
pub struct RunArgs {
    /// Input script. Defaults to `-` for stdin.
    #[arg(value_parser, default_value = "-")]
    pub input: Input,
    /// Stop at the first rejected operation and exit with an error.
    #[arg(long)]
    pub fail_fast: bool,
    /// Graph configuration overrides.
    #[command(flatten)]
    pub graph: GraphArgs,
    /// Output options.
    #[command(flatten)]
    pub output: OutputArgs,
}

impl RunArgs {
    /// Read the script from the input.
    pub fn read_script(&mut self) -> Result<Script, CliError> {
        let mut script: Script = serde_json::from_reader(&mut self.input)?;
        script.config = self.graph.apply(script.config);
        Ok(script)
    }

    /// Run the script.
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.output.init_tracing();
        let script = self.read_script()?;
        let report = script.run(self.fail_fast)?;
        self.output.write_report(&report)?;
        Ok(())
    }
}
