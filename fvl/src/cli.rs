// fvl/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use fvl_common::error::Result;
use fvl_core::ViewSupervisor;

pub mod close;
pub mod locate;
pub mod open;

use crate::cli::close::Close;
use crate::cli::locate::Locate;
use crate::cli::open::Open;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "fvl", bin_name = "fvl")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the view for a page URL
    Open(Open),
    /// Terminate a view started by `open`
    Close(Close),
    /// Print the bundle that `open` would launch
    Locate(Locate),
}

impl Command {
    pub async fn run(&self, supervisor: &ViewSupervisor) -> Result<()> {
        match self {
            Self::Open(command) => command.run(supervisor).await,
            Self::Close(command) => command.run(supervisor).await,
            Self::Locate(command) => command.run(supervisor).await,
        }
    }
}
