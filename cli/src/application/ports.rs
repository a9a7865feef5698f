//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;

use crate::domain::{Hapfile, SshCredentials, Submodule};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program in the current directory and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with `dir` as its working directory and capture its output.
    async fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Output>;
}

// ── SSH Ports ─────────────────────────────────────────────────────────────────

/// Dials a host and opens one exec-capable session.
///
/// Credential handling (identity file vs password) is the implementation's
/// concern; the orchestration layer only hands over `SshCredentials`.
#[allow(async_fn_in_trait)]
pub trait SshConnector {
    type Session: SshSession;

    /// Dial `creds.addr`, authenticate and open a session.
    ///
    /// # Errors
    ///
    /// Returns an error on dial, authentication or session-creation failure.
    /// A failed connect leaves nothing open.
    async fn connect(&self, creds: &SshCredentials) -> Result<Self::Session>;
}

/// One live SSH session.
#[allow(async_fn_in_trait)]
pub trait SshSession {
    /// Run `command` verbatim in the remote shell, copying its stdout and
    /// stderr into the given sinks as data arrives.
    ///
    /// Returns the remote exit status. Transport failures are errors; a
    /// non-zero exit is not.
    async fn exec(
        &mut self,
        command: &str,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> Result<u32>;

    /// Tear the session down.
    async fn close(self) -> Result<()>;
}

// ── Local Git Port ────────────────────────────────────────────────────────────

/// Local repository introspection and push, backed by the git CLI.
#[allow(async_fn_in_trait)]
pub trait LocalGit {
    /// Load the identity file into the local ssh-agent.
    async fn add_identity(&self, identity: &Path) -> Result<()>;
    /// Current branch name, or `HEAD` when detached.
    async fn current_branch(&self, work: &Path) -> Result<String>;
    /// Push `refspec` from `work` to `repo`.
    async fn push(&self, work: &Path, repo: &str, refspec: &str) -> Result<()>;
    /// Submodules declared in `work/.gitmodules`; empty when there is none.
    async fn submodules(&self, work: &Path) -> Result<Vec<Submodule>>;
}

// ── Output Port ───────────────────────────────────────────────────────────────

/// Destinations for remote output, labeled with the originating host.
pub trait OutputStreams {
    /// Sink for the remote command's stdout.
    fn stdout(&self, host: &str) -> Box<dyn Write + Send>;
    /// Sink for the remote command's stderr.
    fn stderr(&self, host: &str) -> Box<dyn Write + Send>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading the Hapfile.
pub trait HapfileStore {
    /// Load and parse the Hapfile.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or malformed.
    fn load(&self) -> Result<Hapfile>;
    /// Location the Hapfile is read from.
    fn path(&self) -> PathBuf;
}
