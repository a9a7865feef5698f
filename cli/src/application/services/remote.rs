//! Remote target orchestration: initialize, push, submodules, build.
//!
//! A `Remote` owns at most one SSH session. `execute` opens it on demand
//! and always closes it before returning, so every remote command batch
//! pays for its own connection.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::application::ports::{LocalGit, OutputStreams, SshConnector, SshSession};
use crate::domain::command::{
    ALREADY_BUILT_MESSAGE, ALREADY_BUILT_STATUS, build_batch, compose_command, env_preamble, initialize_batch,
    push_refspec,
};
use crate::domain::{Host, RemoteError, RepositoryBinding, SshCredentials, Submodule};

/// One provisionable machine plus its repository binding.
pub struct Remote<C: SshConnector, G: LocalGit> {
    /// Directory on the remote, relative to the login directory.
    pub dir: String,
    pub repo: RepositoryBinding,
    host: Arc<Host>,
    creds: Arc<SshCredentials>,
    connector: Arc<C>,
    git: Arc<G>,
    streams: Arc<dyn OutputStreams + Send + Sync>,
    session: Option<C::Session>,
}

impl<C: SshConnector, G: LocalGit> Remote<C, G> {
    /// Create a remote for `host` mirroring the repository checked out at
    /// `work`. The remote directory is named after `work`'s last component.
    ///
    /// # Errors
    ///
    /// Returns an error if `work` has no final component (e.g. `/`).
    pub fn new(
        host: Arc<Host>,
        connector: Arc<C>,
        git: Arc<G>,
        streams: Arc<dyn OutputStreams + Send + Sync>,
        work: &Path,
    ) -> Result<Self> {
        let dir = work
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("cannot name a remote directory after {}", work.display()))?
            .to_string();
        let creds = Arc::new(host.credentials());
        let repo = RepositoryBinding::new(&creds, &dir, work.to_path_buf());
        Ok(Self {
            dir,
            repo,
            host,
            creds,
            connector,
            git,
            streams,
            session: None,
        })
    }

    /// The host this remote provisions.
    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Whether a session is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Open the SSH session if none is open.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Connection` if dialing or session creation fails.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        debug!(host = %self.host.name, addr = %self.creds.addr, "opening ssh session");
        let session = self.connector.connect(&self.creds).await.map_err(|e| {
            if e.downcast_ref::<RemoteError>().is_some() {
                e
            } else {
                RemoteError::Connection {
                    addr: self.creds.addr.clone(),
                    reason: format!("{e:#}"),
                }
                .into()
            }
        })?;
        self.session = Some(session);
        Ok(())
    }

    /// Close the SSH session. A no-op when none is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to shut the session down.
    pub async fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => {
                debug!(host = %self.host.name, "closing ssh session");
                session.close().await
            }
            None => Ok(()),
        }
    }

    /// Exports `HAP_HOSTNAME`, `HAP_ADDR` and `HAP_USER` for remote commands.
    #[must_use]
    pub fn env(&self) -> String {
        env_preamble(&self.host, &self.creds)
    }

    /// Run `commands` as one batch on the remote.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Connection` if the session cannot be opened and
    /// `RemoteError::Execution` if the batch exits non-zero or the transport
    /// breaks mid-command.
    pub async fn execute(&mut self, commands: &[String]) -> Result<()> {
        match self.execute_status(commands).await?.status {
            0 => Ok(()),
            status => Err(self.exit_error(status)),
        }
    }

    /// Prepare the remote repository. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Fails fast if the connection cannot be opened, otherwise as `execute`.
    pub async fn initialize(&mut self) -> Result<()> {
        self.connect().await?;
        info!(host = %self.host.name, dir = %self.dir, "initializing remote repository");
        self.execute(&initialize_batch(&self.dir)).await
    }

    /// Push the current branch (or detached HEAD) to the remote repository.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Auth` if the identity cannot be loaded into the
    /// agent and `RemoteError::GitLocal` if git fails.
    pub async fn push(&self) -> Result<()> {
        let identity = self.creds.identity().ok_or_else(|| {
            RemoteError::Auth(format!(
                "host '{}' has no identity file to load into ssh-agent",
                self.host.name
            ))
        })?;
        self.git.add_identity(identity).await?;

        let branch = self.git.current_branch(&self.repo.work).await?;
        let refspec = push_refspec(&branch);
        info!(host = %self.host.name, repo = %self.repo.repo, %refspec, "pushing");
        self.git.push(&self.repo.work, &self.repo.repo, &refspec).await
    }

    /// Initialize and push every submodule declared in `.gitmodules`.
    ///
    /// Every submodule is attempted; failures are collected and returned
    /// together.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Submodules` listing each failed step, or a
    /// config error if `.gitmodules` cannot be read.
    pub async fn push_submodules(&self) -> Result<()> {
        let modules = self.git.submodules(&self.repo.work).await?;
        let mut errors = Vec::new();

        for module in &modules {
            let mut sub = self.submodule(module);
            if let Err(e) = sub.initialize().await {
                warn!(module = %module.path, error = %format!("{e:#}"), "submodule initialize failed");
                errors.push(format!("[{}] {e:#}", module.path));
            }
            if let Err(e) = sub.push().await {
                warn!(module = %module.path, error = %format!("{e:#}"), "submodule push failed");
                errors.push(format!("[{}] {e:#}", module.path));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RemoteError::Submodules(errors).into())
        }
    }

    /// Run the host's build commands behind the build gate.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::AlreadyBuilt` when the gate reported the
    /// current commit as already built, otherwise as `execute`. A build
    /// command exiting with the gate's status is still an execution failure.
    pub async fn build(&mut self) -> Result<()> {
        let batch = build_batch(&self.dir, &self.host.cmds());
        match self.execute_status(&batch).await? {
            Finished { status: 0, .. } => Ok(()),
            Finished {
                status: ALREADY_BUILT_STATUS,
                gate_hit: true,
            } => Err(RemoteError::AlreadyBuilt {
                host: self.host.name.clone(),
            }
            .into()),
            Finished { status, .. } => Err(self.exit_error(status)),
        }
    }

    /// A target for `module`, sharing this remote's host, credentials and
    /// transport.
    #[must_use]
    pub fn submodule(&self, module: &Submodule) -> Self {
        Self {
            dir: format!("{}/{}", self.dir, module.path.trim_matches('/')),
            repo: self.repo.submodule(&module.path),
            host: Arc::clone(&self.host),
            creds: Arc::clone(&self.creds),
            connector: Arc::clone(&self.connector),
            git: Arc::clone(&self.git),
            streams: Arc::clone(&self.streams),
            session: None,
        }
    }

    /// Connect, run the batch, then close whatever happened.
    async fn execute_status(&mut self, commands: &[String]) -> Result<Finished> {
        self.connect().await?;
        let result = self.run(commands).await;
        if let Err(e) = self.close().await {
            warn!(host = %self.host.name, error = %format!("{e:#}"), "failed to close ssh session");
        }
        result
    }

    async fn run(&mut self, commands: &[String]) -> Result<Finished> {
        let Some(command) = compose_command(&self.env(), commands) else {
            return Ok(Finished::default());
        };
        let host = self.host.name.clone();
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| RemoteError::Execution {
                host: host.clone(),
                reason: "no open session".to_string(),
            })?;

        let mut stdout = GateWatch::new(self.streams.stdout(&host));
        let mut stderr = self.streams.stderr(&host);
        debug!(host = %host, %command, "executing");
        let status = session
            .exec(&command, &mut stdout, stderr.as_mut())
            .await
            .map_err(|e| RemoteError::Execution {
                host: host.clone(),
                reason: format!("{e:#}"),
            })?;
        let _ = stdout.flush();
        let _ = stderr.flush();
        debug!(host = %host, status, gate_hit = stdout.seen, "remote command finished");
        Ok(Finished {
            status,
            gate_hit: stdout.seen,
        })
    }

    fn exit_error(&self, status: u32) -> anyhow::Error {
        RemoteError::Execution {
            host: self.host.name.clone(),
            reason: format!("Process exited with status {status}"),
        }
        .into()
    }
}

/// Exit status of a batch and whether the build gate announced itself.
#[derive(Debug, Default, Clone, Copy)]
struct Finished {
    status: u32,
    gate_hit: bool,
}

/// Forwards remote stdout unchanged while watching for the build gate's
/// message, which may arrive split across writes.
struct GateWatch {
    inner: Box<dyn Write + Send>,
    /// Bytes of the previous write that could start the message.
    tail: Vec<u8>,
    seen: bool,
}

impl GateWatch {
    fn new(inner: Box<dyn Write + Send>) -> Self {
        Self {
            inner,
            tail: Vec::new(),
            seen: false,
        }
    }
}

impl Write for GateWatch {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.seen {
            let needle = ALREADY_BUILT_MESSAGE.as_bytes();
            self.tail.extend_from_slice(buf);
            self.seen = self.tail.windows(needle.len()).any(|w| w == needle);
            let keep = needle.len().saturating_sub(1).min(self.tail.len());
            self.tail.drain(..self.tail.len() - keep);
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
