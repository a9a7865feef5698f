//! Command implementations

pub mod build;
pub mod exec;
pub mod hosts;
pub mod push;

use anyhow::Result;

use crate::app::{AppContext, HapRemote};
use crate::cli::HostSelection;

/// Run `f` against a remote for every selected host, one host at a time.
///
/// A failing host is reported and the next one still runs.
///
/// # Errors
///
/// Returns an error if host selection fails or any host failed.
pub async fn for_each_remote(
    app: &AppContext,
    selection: &HostSelection,
    mut f: impl AsyncFnMut(&mut HapRemote) -> Result<()>,
) -> Result<()> {
    let hosts = app.select_hosts(selection)?;
    let total = hosts.len();
    let mut failed = Vec::new();

    for host in hosts {
        let name = host.name.clone();
        app.output.header(&name);
        let result = match app.remote(host) {
            Ok(mut remote) => f(&mut remote).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            app.output.error(&format!("{e:#}"));
            failed.push(name);
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {total} hosts failed: {}",
            failed.len(),
            failed.join(", ")
        )
    }
}
