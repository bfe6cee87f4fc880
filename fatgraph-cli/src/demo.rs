//! The `demo` subcommand.

use std::io::Write;

use clap::Parser;
use fatgraph::{GraphConfig, Node, Version};

use crate::script::{Op, Script};
use crate::{GraphArgs, OutputArgs};

/// Run the built-in scenario: three roots, a small tree below the newest one
/// and three writes to the live root, the last of which copies it.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Run the built-in demonstration scenario.")]
#[non_exhaustive]
pub struct DemoArgs {
    /// Print the scenario as a script instead of running it.
    #[arg(long)]
    pub print_script: bool,
    /// Graph configuration overrides.
    #[command(flatten)]
    pub graph: GraphArgs,
    /// Output options.
    #[command(flatten)]
    pub output: OutputArgs,
}

impl DemoArgs {
    /// Run the demo.
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.output.init_tracing();
        let mut script = demo_script();
        script.config = self.graph.apply(script.config);

        if self.print_script {
            if self.output.pretty {
                serde_json::to_writer_pretty(&mut self.output.output, &script)?;
            } else {
                serde_json::to_writer(&mut self.output.output, &script)?;
            }
            writeln!(self.output.output)?;
            return Ok(());
        }

        let report = script.run(false)?;
        self.output.write_report(&report)?;
        Ok(())
    }
}

/// The demonstration scenario.
///
/// ```text
///  v0: 0(1)     v1: 1(10)     v2: 2(100)
///                               │0     │1
///                              3(2)   4(6)
///                               │1     │1
///                              5(3) ◄──┘
///                               │0
///                              6(37)   (inserted at v3)
/// ```
///
/// Followed by the values 11, 22 and 33 written to node 2. With the default
/// configuration the third write copies the root into node 7.
pub fn demo_script() -> Script {
    let n = Node::from;
    let v = Version::new;
    Script {
        config: GraphConfig::default(),
        initial: 1,
        ops: vec![
            Op::InsertRoot {
                value: 10,
                version: v(1),
            },
            Op::InsertRoot {
                value: 100,
                version: v(2),
            },
            Op::InsertVertex {
                value: 2,
                parent: n(2),
                slot: 0,
                version: None,
            },
            Op::InsertVertex {
                value: 6,
                parent: n(2),
                slot: 1,
                version: None,
            },
            Op::InsertVertex {
                value: 3,
                parent: n(3),
                slot: 1,
                version: None,
            },
            Op::InsertVertex {
                value: 37,
                parent: n(5),
                slot: 0,
                version: Some(v(3)),
            },
            Op::InsertValue {
                value: 11,
                node: n(2),
            },
            Op::InsertValue {
                value: 22,
                node: n(2),
            },
            Op::InsertValue {
                value: 33,
                node: n(2),
            },
        ],
    }
}

#[cfg(test)]
mod test {
    use fatgraph::WriteOutcome;

    use super::*;
    use crate::script::StepResult;

    #[test]
    fn demo_runs_cleanly() {
        let report = demo_script().run(true).unwrap();
        assert_eq!(report.current_version, Version::new(3));
        assert_eq!(report.nodes.len(), 8);
        assert_eq!(report.live_root, Node::from(7));
        assert_eq!(
            report.steps.last().unwrap().result,
            StepResult::Write {
                outcome: WriteOutcome::Copied {
                    original: Node::from(2),
                    copy: Node::from(7),
                }
            }
        );
        // Sibling propagation and root back-fill.
        assert_eq!(report.nodes[4].out_edges, [None, Some(Node::from(5))]);
        assert_eq!(
            report.nodes[0].out_edges,
            [Some(Node::from(3)), Some(Node::from(4))]
        );
    }
}
