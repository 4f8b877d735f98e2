use clap::{Parser, Subcommand};

use crate::cmds::assign_owners::AssignOwnersCommand;
use crate::cmds::generate::GenerateCommand;

pub mod assign_owners;
pub mod generate;

#[derive(Debug, Parser)]
#[command(name = "compass-catalog")]
pub struct Opt {
    #[arg(
        long,
        help = "Prints a verbose output during the program execution",
        global = true
    )]
    pub debug: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Generate(GenerateCommand),
    #[command(name = "assign-owners")]
    AssignOwners(AssignOwnersCommand),
}
