//! `hap push` — initialize remote repositories and push to them.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::provision;
use crate::cli::HostSelection;
use crate::output::TerminalReporter;

/// Push the current checkout, and its submodules, to every selected host.
///
/// # Errors
///
/// Returns an error if host selection fails or any host failed.
pub async fn run(app: &AppContext, selection: &HostSelection) -> Result<()> {
    let reporter = TerminalReporter::new(&app.output);
    super::for_each_remote(app, selection, async |remote| {
        provision::push(remote, &reporter).await
    })
    .await
}
