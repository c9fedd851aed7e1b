//! Command dispatch: bridges CLI args -> core session -> output formatting.

pub mod config_cmd;
pub mod ls;
pub mod reconcile;
pub mod status;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a PRTG-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Ls(args) => ls::handle(&args, global).await,
        Command::Status => status::handle(global).await,
        Command::Preview(args) => reconcile::preview(&args, false, global).await,
        Command::PreviewChangedOnly(args) => reconcile::preview(&args, true, global).await,
        Command::Apply(args) => reconcile::apply(&args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}
