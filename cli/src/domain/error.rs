//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Remote errors ─────────────────────────────────────────────────────────────

/// Errors raised while provisioning a remote target.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Dialing the host or opening a session failed.
    #[error("cannot connect to {addr}: {reason}")]
    Connection { addr: String, reason: String },

    /// The local SSH identity could not be resolved or loaded into the agent.
    #[error("{0}")]
    Auth(String),

    /// A local git (or ssh-add) invocation exited non-zero.
    ///
    /// The combined output comes first because it usually explains the failure.
    #[error("{output}\n{reason}")]
    GitLocal { output: String, reason: String },

    /// The remote command batch failed or the transport broke mid-command.
    #[error("[{host}] {reason}")]
    Execution { host: String, reason: String },

    /// The build gate found the current commit already stamped in `.happended`.
    #[error("[{host}] Already completed. Commit again?")]
    AlreadyBuilt { host: String },

    /// One or more submodules failed to initialize or push.
    ///
    /// Each entry is already prefixed with `[<module path>]`.
    #[error("{}", .0.join("\n"))]
    Submodules(Vec<String>),
}

impl RemoteError {
    /// Returns `true` when `err` is the build gate's "nothing to do" outcome.
    #[must_use]
    pub fn is_already_built(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<RemoteError>(),
            Some(RemoteError::AlreadyBuilt { .. })
        )
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to the Hapfile and `.gitmodules`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("host '{host}' has no addr")]
    MissingAddr { host: String },

    #[error("host '{host}' has no username")]
    MissingUsername { host: String },

    #[error("host '{host}' needs an identity or a password")]
    MissingAuth { host: String },

    #[error("host '{host}' references unknown build '{build}'")]
    UnknownBuild { host: String, build: String },

    #[error("Unknown host: {name}\n\nDefined hosts: {valid}")]
    UnknownHost { name: String, valid: String },

    #[error("No hosts defined in the Hapfile.")]
    NoHosts,

    #[error("Hapfile defines {0} hosts. Pick one with --host <name> or use --all.")]
    AmbiguousHost(usize),

    #[error("malformed .gitmodules: {0}")]
    Submodules(String),
}
