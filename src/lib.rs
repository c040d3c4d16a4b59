pub mod args;
pub mod core;
pub mod io;
pub mod processes;
pub mod utils;

use crate::args::assemble::AssembleArgs;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Overlap-assemble paired-end reads into a consensus sequence.
    Assemble(AssembleArgs),
}

pub fn run(cli: Cli) -> std::io::Result<()> {
    match cli.command {
        Commands::Assemble(cmd_args) => crate::processes::assemble::assemble_process(&cmd_args),
    }
}
