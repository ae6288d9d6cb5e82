// fvl-core/src/lib.rs

pub mod install;
pub mod launch;
pub mod resolve;
pub mod supervisor;
pub mod token;

// Re-export key types for the CLI crate
pub use install::{ensure_installed, InstallOutcome, InstallReceipt};
pub use launch::{LaunchCommand, LaunchParams};
pub use resolve::{BundleSource, ResolvedBundle, Resolver};
pub use supervisor::{close_view, discard_token, OpenRequest, ViewProcess, ViewSupervisor};
pub use token::{create_token, read_pid};

pub use fvl_aio::process::TerminationStatus;
