//! `hap exec` — run ad-hoc commands in the remote repository directory.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::provision;
use crate::cli::HostSelection;

/// Arguments for the exec command.
#[derive(Args)]
#[command(trailing_var_arg = true)]
pub struct ExecArgs {
    /// Commands to run, chained with `&&`
    #[arg(required = true, allow_hyphen_values = true)]
    pub commands: Vec<String>,
}

/// Run `args.commands` as one batch on every selected host.
///
/// # Errors
///
/// Returns an error if host selection fails or any host failed.
pub async fn run(app: &AppContext, selection: &HostSelection, args: &ExecArgs) -> Result<()> {
    super::for_each_remote(app, selection, async |remote| {
        provision::exec(remote, &args.commands).await
    })
    .await
}
