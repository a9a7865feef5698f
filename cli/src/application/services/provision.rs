//! Provisioning use-cases: the push and build sequences run per host.
//!
//! Imports only from `crate::domain` and `crate::application`.

use anyhow::Result;

use crate::application::ports::{LocalGit, ProgressReporter, SshConnector};
use crate::application::services::remote::Remote;
use crate::domain::RemoteError;

/// How a build sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Build commands ran and the sentinel was stamped.
    Built,
    /// The build gate found the commit already built; nothing ran.
    AlreadyBuilt,
}

/// Initialize the remote repository, push, and push submodules.
///
/// # Errors
///
/// Returns the first failing step's error. Submodule failures are
/// aggregated by `Remote::push_submodules`.
pub async fn push<C: SshConnector, G: LocalGit>(
    remote: &mut Remote<C, G>,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let name = remote.host().name.clone();

    reporter.step(&format!("initializing {name}:{}", remote.dir));
    remote.initialize().await?;

    reporter.step(&format!("pushing to {}", remote.repo.repo));
    remote.push().await?;

    remote.push_submodules().await?;
    reporter.success(&format!("{name} is up to date"));
    Ok(())
}

/// Run `push`, then the build behind the build gate.
///
/// # Errors
///
/// Returns any push or build failure. The "already built" gate result is
/// not an error; it is reported as `BuildOutcome::AlreadyBuilt`.
pub async fn build<C: SshConnector, G: LocalGit>(
    remote: &mut Remote<C, G>,
    reporter: &impl ProgressReporter,
) -> Result<BuildOutcome> {
    push(remote, reporter).await?;

    let name = remote.host().name.clone();
    reporter.step(&format!("building {name}"));
    match remote.build().await {
        Ok(()) => {
            reporter.success(&format!("{name} built"));
            Ok(BuildOutcome::Built)
        }
        Err(e) if RemoteError::is_already_built(&e) => {
            reporter.warn(&e.to_string());
            Ok(BuildOutcome::AlreadyBuilt)
        }
        Err(e) => Err(e),
    }
}

/// Run ad-hoc `commands` inside the remote repository directory.
///
/// # Errors
///
/// Returns `RemoteError::Execution` if the commands fail.
pub async fn exec<C: SshConnector, G: LocalGit>(
    remote: &mut Remote<C, G>,
    commands: &[String],
) -> Result<()> {
    let mut batch = Vec::with_capacity(commands.len() + 1);
    batch.push(format!("cd {}", remote.dir));
    batch.extend(commands.iter().cloned());
    remote.execute(&batch).await
}
