//! Remote command composition and the fixed shell snippets hap installs.
//!
//! The snippets below are interpreted by hosts provisioned with earlier
//! releases. Their text must stay byte-identical.

use crate::domain::host::{Host, SshCredentials};

/// Sentinel file holding the last built commit hash, relative to the repo dir.
pub const SENTINEL: &str = ".happended";

/// Build gate: exits 2 when HEAD matches the stamped sentinel.
pub const HAPPENED_GUARD: &str = "if [[ $(git rev-parse HEAD) = $(cat .happended) ]]; then echo \"Already completed. Commit again?\"; exit 2; fi";

/// Line the build gate prints on stdout before exiting with
/// `ALREADY_BUILT_STATUS`.
pub const ALREADY_BUILT_MESSAGE: &str = "Already completed. Commit again?";

/// Exit status the build gate uses for "nothing to do". Build commands may
/// exit with it too (`make` does on any failure), so it only counts together
/// with `ALREADY_BUILT_MESSAGE`.
pub const ALREADY_BUILT_STATUS: u32 = 2;

/// Stamps the current HEAD into the sentinel after a successful build.
pub const STAMP_SENTINEL: &str = "echo `git rev-parse HEAD` > .happended";

/// Writes the `post-receive` hook that checks out every pushed branch into
/// the working tree. Runs inside `sh -c '...'`, so it holds no single quotes.
pub const POST_RECEIVE_HOOK: &str = "echo \"#!/bin/sh
cd ..
GIT_DIR=.git
while read oldrev newrev refname; do
  git checkout -q -f \\${refname#refs/heads/}
done
\" > .git/hooks/post-receive";

/// Branch a detached HEAD is pushed to on the remote.
pub const DETACHED_REFSPEC: &str = "HEAD:refs/heads/happened";

/// Environment preamble exported ahead of every remote command.
#[must_use]
pub fn env_preamble(host: &Host, creds: &SshCredentials) -> String {
    format!(
        "export HAP_HOSTNAME=\"{}\";export HAP_ADDR=\"{}\";export HAP_USER=\"{}\";",
        host.name, creds.addr, creds.username
    )
}

/// Builds the command line sent to the remote shell.
///
/// A single command runs as-is after `env`; several are joined with `&&`
/// inside one `sh -c '...'` so `cd` and `export` carry across the batch.
/// Returns `None` for an empty batch.
#[must_use]
pub fn compose_command(env: &str, commands: &[String]) -> Option<String> {
    match commands {
        [] => None,
        [only] => Some(format!("{env}{only}")),
        many => Some(format!("sh -c '{env}{}'", many.join("&&"))),
    }
}

/// Refspec to push for the branch reported by `git rev-parse --abbrev-ref HEAD`.
#[must_use]
pub fn push_refspec(branch: &str) -> String {
    let branch = branch.trim();
    if branch == "HEAD" {
        DETACHED_REFSPEC.to_string()
    } else {
        branch.to_string()
    }
}

/// Command batch that prepares a non-bare repository accepting pushes in `dir`.
#[must_use]
pub fn initialize_batch(dir: &str) -> Vec<String> {
    vec![
        format!("GIT_DIR=\"{dir}\""),
        "mkdir -p $GIT_DIR".to_string(),
        "cd $GIT_DIR".to_string(),
        "git init -q".to_string(),
        "git config receive.denyCurrentBranch ignore".to_string(),
        "touch .git/hooks/post-receive".to_string(),
        "chmod a+x .git/hooks/post-receive".to_string(),
        POST_RECEIVE_HOOK.to_string(),
    ]
}

/// Command batch that runs `cmds` in `dir` behind the build gate and stamps
/// the sentinel afterwards.
#[must_use]
pub fn build_batch(dir: &str, cmds: &[String]) -> Vec<String> {
    let mut batch = vec![
        format!("cd {dir}"),
        format!("touch {SENTINEL}"),
        HAPPENED_GUARD.to_string(),
    ];
    batch.extend(cmds.iter().cloned());
    batch.push(STAMP_SENTINEL.to_string());
    batch
}
