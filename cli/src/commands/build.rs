//! `hap build` — push, then run the build commands once per commit.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::provision;
use crate::cli::HostSelection;
use crate::output::TerminalReporter;

/// Build every selected host.
///
/// A host that already built the current commit is reported and counts as
/// a success.
///
/// # Errors
///
/// Returns an error if host selection fails or any host failed.
pub async fn run(app: &AppContext, selection: &HostSelection) -> Result<()> {
    let reporter = TerminalReporter::new(&app.output);
    super::for_each_remote(app, selection, async |remote| {
        provision::build(remote, &reporter).await.map(drop)
    })
    .await
}
