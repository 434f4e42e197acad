//! Command handlers, one module per command group.

pub mod config_cmd;
pub mod entry;
pub mod inspect;
pub mod util;

use redirectctl_core::Reconciler;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that talks to Graph.
pub async fn dispatch(
    cmd: Command,
    reconciler: &Reconciler,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Show(args) => inspect::show(reconciler, &args, global).await,
        Command::Plan(args) => inspect::plan(reconciler, &args, global).await,
        Command::Refresh(args) => inspect::refresh(reconciler, &args, global).await,
        Command::Apply(args) => entry::apply(reconciler, args, global).await,
        Command::Import(args) => entry::import(reconciler, args, global).await,
        Command::Destroy(args) => entry::destroy(reconciler, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "offline command dispatched to Graph".into(),
        }),
    }
}
