//! Hapfile schema and host resolution.
//!
//! Pure functions only — no I/O, no async, no filesystem access. Loading the
//! file lives in `crate::infra::hapfile`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::host::{Auth, Host};

/// Default Hapfile name, looked up in the current directory.
pub const DEFAULT_HAPFILE: &str = "Hapfile";

// ── Schema ───────────────────────────────────────────────────────────────────

/// Top-level Hapfile document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hapfile {
    /// Settings merged into every host.
    pub default: HostEntry,
    /// Named command groups referenced by `build`.
    pub builds: BTreeMap<String, BuildEntry>,
    pub hosts: BTreeMap<String, HostEntry>,
}

/// One `hosts.<name>` (or `default`) section. Every field is optional so that
/// hosts can inherit from `default`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostEntry {
    pub addr: Option<String>,
    pub username: Option<String>,
    pub identity: Option<PathBuf>,
    pub password: Option<String>,
    /// Names of entries under `builds`.
    pub build: Vec<String>,
    pub cmd: Vec<String>,
}

/// A named group of commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildEntry {
    pub cmd: Vec<String>,
}

// ── Resolution ───────────────────────────────────────────────────────────────

impl Hapfile {
    /// Resolves every host, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any host is incomplete or references an
    /// unknown build.
    pub fn hosts(&self) -> Result<Vec<Host>> {
        self.hosts
            .iter()
            .map(|(name, entry)| self.resolve(name, entry))
            .collect()
    }

    /// Resolves the hosts picked by `names`, or all hosts when `all` is set.
    ///
    /// With no names and `all` unset, a Hapfile with exactly one host
    /// selects it.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for unknown names, an empty Hapfile, or an
    /// ambiguous selection.
    pub fn select(&self, names: &[String], all: bool) -> Result<Vec<Host>> {
        if self.hosts.is_empty() {
            return Err(ConfigError::NoHosts.into());
        }
        if all {
            return self.hosts();
        }
        if names.is_empty() {
            if self.hosts.len() == 1 {
                return self.hosts();
            }
            return Err(ConfigError::AmbiguousHost(self.hosts.len()).into());
        }
        names
            .iter()
            .map(|name| {
                let entry = self.hosts.get(name).ok_or_else(|| ConfigError::UnknownHost {
                    name: name.clone(),
                    valid: self.hosts.keys().cloned().collect::<Vec<_>>().join(", "),
                })?;
                self.resolve(name, entry)
            })
            .collect()
    }

    fn resolve(&self, name: &str, entry: &HostEntry) -> Result<Host> {
        let d = &self.default;
        let addr = entry
            .addr
            .clone()
            .or_else(|| d.addr.clone())
            .ok_or_else(|| ConfigError::MissingAddr { host: name.to_string() })?;
        let username = entry
            .username
            .clone()
            .or_else(|| d.username.clone())
            .ok_or_else(|| ConfigError::MissingUsername { host: name.to_string() })?;

        // A host-level password beats an inherited identity and vice versa.
        let auth = match (&entry.identity, &entry.password, &d.identity, &d.password) {
            (Some(identity), _, _, _) => Auth::Identity(identity.clone()),
            (None, Some(password), _, _) => Auth::Password(password.clone()),
            (None, None, Some(identity), _) => Auth::Identity(identity.clone()),
            (None, None, None, Some(password)) => Auth::Password(password.clone()),
            (None, None, None, None) => {
                return Err(ConfigError::MissingAuth { host: name.to_string() }.into());
            }
        };

        let mut builds = Vec::new();
        for build in d.build.iter().chain(&entry.build) {
            let group = self.builds.get(build).ok_or_else(|| ConfigError::UnknownBuild {
                host: name.to_string(),
                build: build.clone(),
            })?;
            builds.extend(group.cmd.iter().cloned());
        }

        Ok(Host {
            name: name.to_string(),
            addr,
            username,
            auth,
            builds,
            cmd: d.cmd.iter().chain(&entry.cmd).cloned().collect(),
        })
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
