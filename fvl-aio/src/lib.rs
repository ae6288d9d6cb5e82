// fvl-aio/src/lib.rs
//! Filesystem probes, archive extraction and process control for fvl.

pub mod extract;
pub mod fs;
pub mod process;

pub use extract::extract_archive;
pub use fs::{find_by_extension, find_owner_executables, EntryKind};
pub use process::{kill_pid, spawn_command_async, spawn_command_sync, TerminationStatus};
