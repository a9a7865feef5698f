//! Provisioning target identity: hosts, credentials, repository bindings.
//!
//! Pure data — resolved from the Hapfile by `crate::domain::hapfile` and
//! shared read-only between remote targets.

use std::path::PathBuf;

use serde::Serialize;

/// Default SSH port appended to addresses that carry none.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// A machine to provision, fully resolved from the Hapfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    /// Label used to prefix every line of remote output.
    pub name: String,
    /// Network address, `host` or `host:port`.
    pub addr: String,
    pub username: String,
    #[serde(skip)]
    pub auth: Auth,
    /// Commands expanded from named builds, in declaration order.
    pub builds: Vec<String>,
    /// Extra commands run after the builds.
    pub cmd: Vec<String>,
}

impl Host {
    /// All build commands: expanded builds first, then `cmd`.
    #[must_use]
    pub fn cmds(&self) -> Vec<String> {
        self.builds.iter().chain(&self.cmd).cloned().collect()
    }

    /// Credentials used to dial this host.
    #[must_use]
    pub fn credentials(&self) -> SshCredentials {
        SshCredentials {
            addr: self.addr.clone(),
            username: self.username.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// Authentication material for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// Path to a private key file (may start with `~`).
    Identity(PathBuf),
    Password(String),
}

impl Default for Auth {
    fn default() -> Self {
        Self::Password(String::new())
    }
}

/// Address, username and authentication material for one SSH endpoint.
///
/// Opaque to the orchestration layer beyond `addr` and `username`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshCredentials {
    pub addr: String,
    pub username: String,
    pub auth: Auth,
}

impl SshCredentials {
    /// Address to dial: `addr` with the default port appended if missing.
    #[must_use]
    pub fn dial_addr(&self) -> String {
        if has_port(&self.addr) {
            self.addr.clone()
        } else {
            format!("{}:{DEFAULT_SSH_PORT}", self.addr)
        }
    }

    /// The identity file path, if key authentication is configured.
    #[must_use]
    pub fn identity(&self) -> Option<&PathBuf> {
        match &self.auth {
            Auth::Identity(path) => Some(path),
            Auth::Password(_) => None,
        }
    }
}

fn has_port(addr: &str) -> bool {
    // [::1]:22 style or host:22; bare IPv6 literals have more than one colon.
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.contains("]:");
    }
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.contains(':') && port.parse::<u16>().is_ok(),
        None => false,
    }
}

/// Pairing of a local working path with the remote repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryBinding {
    /// Remote URL, `ssh://user@addr/~/<dir>`.
    pub repo: String,
    /// Local working directory the git CLI runs in.
    pub work: PathBuf,
}

impl RepositoryBinding {
    /// Binding for the top-level repository of a target.
    #[must_use]
    pub fn new(creds: &SshCredentials, dir: &str, work: PathBuf) -> Self {
        Self {
            repo: format!("ssh://{}@{}/~/{dir}", creds.username, creds.addr),
            work,
        }
    }

    /// Binding for a submodule nested at `path` below this repository.
    ///
    /// The local work path is `path` relative to this binding's work path.
    #[must_use]
    pub fn submodule(&self, path: &str) -> Self {
        Self {
            repo: format!("{}/{path}", self.repo),
            work: self.work.join(path),
        }
    }
}
