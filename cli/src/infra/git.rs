//! Infrastructure implementation of the `LocalGit` port over the git CLI.

use std::path::Path;
use std::process::Output;

use anyhow::Result;
use tracing::debug;

use crate::application::ports::{CommandRunner, LocalGit};
use crate::domain::RemoteError;
use crate::domain::submodule::{Submodule, parse_submodules};
use crate::domain::ConfigError;
use crate::infra::keys::resolve_identity;

/// Name of the submodule declaration file at the repository root.
pub const GITMODULES: &str = ".gitmodules";

/// `LocalGit` backed by `git` and `ssh-add` processes.
///
/// Generic over `R: CommandRunner` so that tests can inject a recording
/// runner without spawning real processes.
pub struct GitCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GitCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

/// Combined stdout+stderr, for diagnostics.
fn combined(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim_end().to_string()
}

fn ensure_success(output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(RemoteError::GitLocal {
        output: combined(output),
        reason: output.status.to_string(),
    }
    .into())
}

impl<R: CommandRunner> LocalGit for GitCli<R> {
    async fn add_identity(&self, identity: &Path) -> Result<()> {
        let key = resolve_identity(identity)?.to_string_lossy().into_owned();
        let output = self
            .runner
            .run("ssh-add", &[key.as_str()])
            .await
            .map_err(|e| RemoteError::Auth(format!("ssh-add {key}: {e:#}")))?;
        if !output.status.success() {
            return Err(RemoteError::Auth(format!(
                "ssh-add {key}: {}\n{}",
                output.status,
                combined(&output)
            ))
            .into());
        }
        debug!(%key, "identity loaded into ssh-agent");
        Ok(())
    }

    async fn current_branch(&self, work: &Path) -> Result<String> {
        let output = self
            .runner
            .run_in(work, "git", &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        ensure_success(&output)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn push(&self, work: &Path, repo: &str, refspec: &str) -> Result<()> {
        let output = self
            .runner
            .run_in(work, "git", &["push", repo, refspec])
            .await?;
        ensure_success(&output)
    }

    async fn submodules(&self, work: &Path) -> Result<Vec<Submodule>> {
        if !work.join(GITMODULES).is_file() {
            return Ok(Vec::new());
        }
        let output = self
            .runner
            .run_in(
                work,
                "git",
                &["config", "--file", GITMODULES, "--null", "--get-regexp", "^submodule\\."],
            )
            .await?;
        // git config exits 1 when nothing matches.
        match output.status.code() {
            Some(0) => parse_submodules(&String::from_utf8_lossy(&output.stdout)),
            Some(1) if output.stdout.is_empty() => Ok(Vec::new()),
            _ => Err(ConfigError::Submodules(combined(&output)).into()),
        }
    }
}
