use clap::Args;
use colored::Colorize;
use fvl_common::error::Result;
use fvl_core::ViewSupervisor;

#[derive(Args, Debug)]
pub struct Locate {}

impl Locate {
    pub async fn run(&self, supervisor: &ViewSupervisor) -> Result<()> {
        let bundle = supervisor.resolve_async().await?;
        println!(
            "{} {}",
            bundle.path.display(),
            format!("({})", bundle.source).dimmed()
        );
        Ok(())
    }
}
