use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use fvl_common::error::Result;
use fvl_core::ViewSupervisor;

#[derive(Args, Debug)]
pub struct Close {
    /// Token path printed by `fvl open`
    pub token: PathBuf,
}

impl Close {
    pub async fn run(&self, supervisor: &ViewSupervisor) -> Result<()> {
        match supervisor.close(Some(&self.token)) {
            Some(status) => println!("{}", status),
            None => println!("{}", "nothing to close".dimmed()),
        }
        Ok(())
    }
}
