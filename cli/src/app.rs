//! Application context — unified state passed to every command handler.
//!
//! `AppContext` wires the production adapters (russh transport, git CLI,
//! process streams, Hapfile store) once, so command handlers only decide
//! which hosts to act on and what to run there.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::Remote;
use crate::application::ports::HapfileStore;
use crate::cli::HostSelection;
use crate::domain::{Hapfile, Host};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::git::GitCli;
use crate::infra::hapfile::YamlHapfileStore;
use crate::infra::ssh::RusshConnector;
use crate::output::{OutputContext, ProcessStreams};

/// A `Remote` wired to the production adapters.
pub type HapRemote = Remote<RusshConnector, GitCli<TokioCommandRunner>>;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Explicit Hapfile path (`--file` / `HAP_FILE`).
    pub file: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Where the Hapfile is loaded from.
    pub hapfile: YamlHapfileStore,
    /// Local repository whose checkout is pushed.
    pub work: PathBuf,
    connector: Arc<RusshConnector>,
    git: Arc<GitCli<TokioCommandRunner>>,
    streams: Arc<ProcessStreams>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let work = std::env::current_dir().context("cannot determine current directory")?;

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            hapfile: YamlHapfileStore::new(flags.file.clone()),
            work,
            connector: Arc::new(RusshConnector),
            git: Arc::new(GitCli::new(TokioCommandRunner::new())),
            streams: Arc::new(ProcessStreams),
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Load the Hapfile.
    ///
    /// # Errors
    ///
    /// Returns an error if the Hapfile is missing or malformed.
    pub fn load_hapfile(&self) -> Result<Hapfile> {
        self.hapfile.load()
    }

    /// Load the Hapfile and resolve the hosts picked by `selection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Hapfile cannot be loaded or the selection
    /// does not resolve.
    pub fn select_hosts(&self, selection: &HostSelection) -> Result<Vec<Host>> {
        self.load_hapfile()?.select(&selection.hosts, selection.all)
    }

    /// A remote target for `host` mirroring the current checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot name a remote
    /// directory.
    pub fn remote(&self, host: Host) -> Result<HapRemote> {
        Remote::new(
            Arc::new(host),
            Arc::clone(&self.connector),
            Arc::clone(&self.git),
            self.streams.clone(),
            &self.work,
        )
    }
}
