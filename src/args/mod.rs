use crate::Cli;
use clap::{CommandFactory, error::ErrorKind};

pub mod assemble;

/// Aborts clap with a given error `message` due to a custom parsing error
/// discovered after clap's own parsing succeeded (e.g. a primer sequence
/// containing non-IUPAC bytes).
pub(crate) fn abort_clap(kind: ErrorKind, message: impl std::fmt::Display, subcommand: Option<&str>) -> ! {
    let mut command = Cli::command();

    if let Some(subcommand) = subcommand
        && let Some(c) = command.get_subcommands_mut().find(|c| c.get_name() == subcommand)
    {
        c.error(kind, message).exit();
    } else {
        command.error(kind, message).exit()
    }
}
