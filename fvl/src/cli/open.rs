use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use fvl_common::error::Result;
use fvl_core::{OpenRequest, ViewSupervisor};

#[derive(Args, Debug)]
pub struct Open {
    /// Page URL the view connects to
    pub url: String,

    /// Directory with static assets, passed through to the view
    #[arg(long, value_name = "DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Start with the window hidden
    #[arg(long)]
    pub hidden: bool,

    /// Block until the view exits, then clean up its token
    #[arg(long)]
    pub wait: bool,
}

impl Open {
    pub async fn run(&self, supervisor: &ViewSupervisor) -> Result<()> {
        let mut request = OpenRequest::new(&self.url).hidden(self.hidden);
        if let Some(dir) = &self.assets_dir {
            request = request.assets_dir(dir);
        }

        let (mut process, token) = supervisor.open_async(&request).await?;
        println!("{}", token.display());

        if self.wait {
            let status = supervisor.wait_for_exit(&mut process, &token).await?;
            if !status.success() {
                eprintln!("{} view exited with {}", "Warning:".yellow(), status);
            }
        }
        Ok(())
    }
}
