//! The [`Command`] trait run by each `samfilter` subcommand.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// A subcommand of the `samfilter` binary.
///
/// `command_line` is the full invocation, recorded in the output `@PG` record.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
