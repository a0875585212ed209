mod commands;

use crate::commands::clean::CleanArgs;
use crate::commands::init::InitArgs;
use crate::commands::synth::SynthArgs;
use crate::commands::{handle_clean, handle_graph, handle_init, handle_synth, handle_validate};
use clap::{Parser, Subcommand};
use common::error::StackError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackgen")]
pub struct Cli {
    #[arg(
        long = "config-path",
        short = 'c',
        help = "directory containing stack.yml",
        global = true
    )]
    pub config_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Create a new stack scaffold
    Init(InitArgs),
    /// Build the stack and write the engine configuration
    Synth(SynthArgs),
    /// Print the resource dependency graph
    Graph,
    /// Build the stack and report the declaration order
    Validate,
    /// Remove generated files
    Clean(CleanArgs),
}

fn run_cmd(func: Result<(), StackError>) {
    if let Err(e) = func {
        tracing::error!("{e}");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn main() {
    logging::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Cmd::Init(args) => {
            if let Err(e) = handle_init(&args.path, &args.name, &args.project, &args.region) {
                eprintln!(
                    "Failed to initialize stack at {}: {}",
                    args.path.display(),
                    e
                );
                std::process::exit(1);
            }
        }
        Cmd::Synth(args) => run_cmd(handle_synth(&args.out, cli.config_path).map(|_| ())),
        Cmd::Graph => run_cmd(handle_graph(cli.config_path)),
        Cmd::Validate => run_cmd(handle_validate(cli.config_path).map(|_| ())),
        Cmd::Clean(args) => run_cmd(handle_clean(&args.out)),
    }
}
