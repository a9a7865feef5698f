//! SSH session transport over `russh`.
//!
//! `RusshConnector` turns `SshCredentials` into an authenticated client
//! handle; `RusshSession` runs each command on a fresh exec channel of that
//! handle and disconnects on `close`.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use russh::keys::ssh_key::PublicKey;
use russh::keys::{PrivateKeyWithHashAlg, check_known_hosts, load_secret_key};
use russh::{ChannelMsg, Disconnect, client};
use tracing::{debug, warn};

use crate::application::ports::{SshConnector, SshSession};
use crate::domain::host::DEFAULT_SSH_PORT;
use crate::domain::{Auth, RemoteError, SshCredentials};
use crate::infra::keys::resolve_identity;

/// Extended-data stream id carrying stderr.
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Host key policy: keys in `~/.ssh/known_hosts` must match; unknown hosts
/// are accepted with a warning.
pub struct HostKeyCheck {
    host: String,
    port: u16,
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        match check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!(host = %self.host, port = self.port, "host key not in known_hosts, accepting");
                Ok(true)
            }
            Err(e) => {
                warn!(host = %self.host, port = self.port, error = %e, "host key mismatch");
                Ok(false)
            }
        }
    }
}

/// Production `SshConnector` backed by `russh`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RusshConnector;

/// Splits `host:port` (or `[v6]:port`) into its parts.
fn split_addr(addr: &str) -> (String, u16) {
    let parsed = addr
        .rsplit_once(':')
        .and_then(|(host, port)| Some((host, port.parse::<u16>().ok()?)));
    match parsed {
        Some((host, port)) => (host.trim_start_matches('[').trim_end_matches(']').to_string(), port),
        None => (addr.to_string(), DEFAULT_SSH_PORT),
    }
}

impl SshConnector for RusshConnector {
    type Session = RusshSession;

    async fn connect(&self, creds: &SshCredentials) -> Result<RusshSession> {
        let (host, port) = split_addr(&creds.dial_addr());
        let connection_error = |reason: String| RemoteError::Connection {
            addr: creds.addr.clone(),
            reason,
        };

        let config = Arc::new(client::Config::default());
        let check = HostKeyCheck {
            host: host.clone(),
            port,
        };
        let mut handle = client::connect(config, (host.as_str(), port), check)
            .await
            .map_err(|e| connection_error(e.to_string()))?;
        debug!(%host, port, "ssh transport established");

        let authenticated = match &creds.auth {
            Auth::Identity(identity) => {
                let path = resolve_identity(identity)?;
                let key = load_secret_key(&path, None).map_err(|e| {
                    RemoteError::Auth(format!("cannot load {}: {e}", path.display()))
                })?;
                let hash = handle
                    .best_supported_rsa_hash()
                    .await
                    .map_err(|e| connection_error(e.to_string()))?
                    .flatten();
                handle
                    .authenticate_publickey(
                        &creds.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash),
                    )
                    .await
                    .map_err(|e| connection_error(e.to_string()))?
                    .success()
            }
            Auth::Password(password) => handle
                .authenticate_password(&creds.username, password)
                .await
                .map_err(|e| connection_error(e.to_string()))?
                .success(),
        };

        if !authenticated {
            return Err(connection_error(format!(
                "authentication failed for {}",
                creds.username
            ))
            .into());
        }
        Ok(RusshSession { handle })
    }
}

/// An authenticated `russh` client handle.
pub struct RusshSession {
    handle: client::Handle<HostKeyCheck>,
}

impl SshSession for RusshSession {
    async fn exec(
        &mut self,
        command: &str,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> Result<u32> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .context("cannot open session channel")?;
        channel
            .exec(true, command)
            .await
            .context("cannot start remote command")?;

        let mut exit_status = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => {
                    stdout.write_all(&data).context("writing remote stdout")?;
                }
                ChannelMsg::ExtendedData { data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    stderr.write_all(&data).context("writing remote stderr")?;
                }
                ChannelMsg::ExitStatus { exit_status: status } => {
                    exit_status = Some(status);
                }
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    anyhow::bail!("remote command killed by signal {signal_name:?}");
                }
                _ => {}
            }
        }

        exit_status.context("remote command exited without reporting a status")
    }

    async fn close(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .context("disconnecting ssh session")
    }
}
