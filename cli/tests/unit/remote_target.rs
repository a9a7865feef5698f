//! Tests for the `Remote` service against fake transports.

#![allow(clippy::expect_used)]

use std::path::PathBuf;

use hap_cli::domain::command::{initialize_batch, DETACHED_REFSPEC};
use hap_cli::domain::RemoteError;

use crate::mocks::{Fakes, WORK, host, password_host, strings, submodule};

const ENV: &str =
    r#"export HAP_HOSTNAME="web1";export HAP_ADDR="10.0.0.1";export HAP_USER="deploy";"#;

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn test_new_names_remote_dir_after_work_dir() {
    let fakes = Fakes::new();
    let remote = fakes.remote(host());
    assert_eq!(remote.dir, "site");
    assert_eq!(remote.repo.repo, "ssh://deploy@10.0.0.1/~/site");
    assert_eq!(remote.repo.work, PathBuf::from(WORK));
    assert!(!remote.is_connected());
}

#[test]
fn test_env_exports_host_addr_and_user() {
    let fakes = Fakes::new();
    assert_eq!(fakes.remote(host()).env(), ENV);
}

// ── Connect / close ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_twice_dials_once() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.connect().await.expect("connect");
    remote.connect().await.expect("connect again");
    assert!(remote.is_connected());
    assert_eq!(fakes.ssh().dials, 1);

    remote.close().await.expect("close");
    assert!(!remote.is_connected());
    assert_eq!(fakes.ssh().closes, 1);
}

#[tokio::test]
async fn test_close_without_session_is_noop() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.close().await.expect("close");
    assert_eq!(fakes.ssh().closes, 0);
}

#[tokio::test]
async fn test_connect_failure_is_connection_error() {
    let fakes = Fakes::new();
    fakes.ssh().refuse = Some("connection refused".to_string());
    let mut remote = fakes.remote(host());
    let err = remote.connect().await.expect_err("refused");
    match err.downcast_ref::<RemoteError>() {
        Some(RemoteError::Connection { addr, reason }) => {
            assert_eq!(addr, "10.0.0.1");
            assert!(reason.contains("connection refused"));
        }
        other => panic!("expected connection error, got {other:?}"),
    }
    assert!(!remote.is_connected());
}

// ── Execute ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_single_command_is_prefixed_with_env() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.execute(&strings(&["uptime"])).await.expect("execute");
    assert_eq!(fakes.ssh().commands, vec![format!("{ENV}uptime")]);
}

#[tokio::test]
async fn test_execute_many_commands_runs_one_shell() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote
        .execute(&strings(&["cd site", "make"]))
        .await
        .expect("execute");
    assert_eq!(fakes.ssh().commands, vec![format!("sh -c '{ENV}cd site&&make'")]);
}

#[tokio::test]
async fn test_execute_always_closes_its_session() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.execute(&strings(&["true"])).await.expect("execute");
    remote.execute(&strings(&["true"])).await.expect("execute");
    let ssh = fakes.ssh();
    assert_eq!(ssh.dials, 2);
    assert_eq!(ssh.closes, 2);
    assert_eq!(ssh.open, 0);
    drop(ssh);
    assert!(!remote.is_connected());
}

#[tokio::test]
async fn test_execute_nonzero_exit_is_execution_error_and_closes() {
    let fakes = Fakes::new();
    fakes.ssh().statuses.push_back(3);
    let mut remote = fakes.remote(host());
    let err = remote.execute(&strings(&["false"])).await.expect_err("exit 3");
    assert_eq!(err.to_string(), "[web1] Process exited with status 3");
    assert!(matches!(
        err.downcast_ref::<RemoteError>(),
        Some(RemoteError::Execution { .. })
    ));
    assert_eq!(fakes.ssh().open, 0);
}

#[tokio::test]
async fn test_execute_transport_failure_is_execution_error_and_closes() {
    let fakes = Fakes::new();
    fakes.ssh().break_transport = Some("channel closed".to_string());
    let mut remote = fakes.remote(host());
    let err = remote.execute(&strings(&["sleep 1"])).await.expect_err("broken");
    assert!(err.to_string().starts_with("[web1] "));
    assert!(err.to_string().contains("channel closed"));
    assert_eq!(fakes.ssh().closes, 1);
}

#[tokio::test]
async fn test_execute_empty_batch_sends_nothing() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.execute(&[]).await.expect("empty batch");
    let ssh = fakes.ssh();
    assert!(ssh.commands.is_empty());
    assert_eq!(ssh.open, 0);
}

#[tokio::test]
async fn test_remote_output_is_prefixed_per_line() {
    let fakes = Fakes::new();
    {
        let mut ssh = fakes.ssh();
        ssh.stdout = b"line1\nline2\n".to_vec();
        ssh.stderr = b"warning: shallow\n".to_vec();
    }
    let mut remote = fakes.remote(host());
    remote.execute(&strings(&["cat log"])).await.expect("execute");
    assert_eq!(fakes.streams.stdout.text(), "[web1] line1\n[web1] line2\n");
    assert_eq!(fakes.streams.stderr.text(), "[web1] warning: shallow\n");
}

// ── Initialize ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_initialize_runs_init_batch_in_one_shell() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.initialize().await.expect("initialize");
    let expected = format!("sh -c '{ENV}{}'", initialize_batch("site").join("&&"));
    assert_eq!(fakes.ssh().commands, vec![expected]);
}

#[tokio::test]
async fn test_initialize_twice_succeeds() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.initialize().await.expect("initialize");
    remote.initialize().await.expect("initialize again");
    assert_eq!(fakes.ssh().commands.len(), 2);
}

#[tokio::test]
async fn test_initialize_fails_fast_on_connect_error() {
    let fakes = Fakes::new();
    fakes.ssh().refuse = Some("no route to host".to_string());
    let mut remote = fakes.remote(host());
    let err = remote.initialize().await.expect_err("refused");
    assert!(matches!(
        err.downcast_ref::<RemoteError>(),
        Some(RemoteError::Connection { .. })
    ));
    assert!(fakes.ssh().commands.is_empty());
}

// ── Push ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_push_loads_identity_and_pushes_branch() {
    let fakes = Fakes::new();
    let remote = fakes.remote(host());
    remote.push().await.expect("push");
    let git = fakes.git();
    assert_eq!(git.identities, vec![PathBuf::from("/keys/id_ed25519")]);
    assert_eq!(
        git.pushes,
        vec![(
            PathBuf::from(WORK),
            "ssh://deploy@10.0.0.1/~/site".to_string(),
            "main".to_string()
        )]
    );
    drop(git);
    assert_eq!(fakes.ssh().dials, 0);
}

#[tokio::test]
async fn test_push_detached_head_pushes_named_branch() {
    let fakes = Fakes::new();
    fakes.git().branch = "HEAD".to_string();
    fakes.remote(host()).push().await.expect("push");
    assert_eq!(fakes.git().pushes[0].2, DETACHED_REFSPEC);
}

#[tokio::test]
async fn test_push_identity_failure_stops_before_git() {
    let fakes = Fakes::new();
    fakes.git().agent_down = true;
    let err = fakes.remote(host()).push().await.expect_err("agent down");
    assert!(matches!(err.downcast_ref::<RemoteError>(), Some(RemoteError::Auth(_))));
    assert!(fakes.git().pushes.is_empty());
}

#[tokio::test]
async fn test_push_requires_identity() {
    let fakes = Fakes::new();
    let err = fakes
        .remote(password_host())
        .push()
        .await
        .expect_err("no identity");
    assert!(matches!(err.downcast_ref::<RemoteError>(), Some(RemoteError::Auth(_))));
    assert!(fakes.git().pushes.is_empty());
}

#[tokio::test]
async fn test_push_rejection_keeps_git_output() {
    let fakes = Fakes::new();
    fakes.git().reject.push("/~/site".to_string());
    let err = fakes.remote(host()).push().await.expect_err("rejected");
    assert_eq!(
        err.to_string(),
        "! [rejected] (non-fast-forward)\nexit status: 1"
    );
}

// ── Submodules ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_push_submodules_without_modules_does_nothing() {
    let fakes = Fakes::new();
    fakes.remote(host()).push_submodules().await.expect("no submodules");
    assert_eq!(fakes.ssh().dials, 0);
    assert!(fakes.git().pushes.is_empty());
}

#[tokio::test]
async fn test_push_submodules_initializes_and_pushes_each() {
    let fakes = Fakes::new();
    fakes.git().submodules = vec![submodule("lib/a"), submodule("lib/b")];
    fakes.remote(host()).push_submodules().await.expect("submodules");

    let commands = fakes.ssh().commands.clone();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].contains(r#"GIT_DIR="site/lib/a""#));
    assert!(commands[1].contains(r#"GIT_DIR="site/lib/b""#));

    let pushes = fakes.git().pushes.clone();
    assert_eq!(
        pushes,
        vec![
            (
                PathBuf::from("/src/site/lib/a"),
                "ssh://deploy@10.0.0.1/~/site/lib/a".to_string(),
                "main".to_string()
            ),
            (
                PathBuf::from("/src/site/lib/b"),
                "ssh://deploy@10.0.0.1/~/site/lib/b".to_string(),
                "main".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn test_push_submodules_attempts_all_and_aggregates_failures() {
    let fakes = Fakes::new();
    {
        let mut git = fakes.git();
        git.submodules = vec![submodule("lib/a"), submodule("lib/b"), submodule("lib/c")];
        git.reject.push("lib/b".to_string());
    }
    let err = fakes
        .remote(host())
        .push_submodules()
        .await
        .expect_err("lib/b rejected");

    match err.downcast_ref::<RemoteError>() {
        Some(RemoteError::Submodules(failures)) => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].starts_with("[lib/b] "));
            assert!(failures[0].contains("rejected"));
        }
        other => panic!("expected submodule aggregate, got {other:?}"),
    }
    assert_eq!(fakes.git().pushes.len(), 3);
}

#[tokio::test]
async fn test_push_submodules_reports_init_and_push_failures_per_module() {
    let fakes = Fakes::new();
    {
        let mut git = fakes.git();
        git.submodules = vec![submodule("lib/a"), submodule("lib/b")];
        git.reject.push("lib/a".to_string());
    }
    fakes.ssh().statuses.extend([0, 1]);
    let err = fakes
        .remote(host())
        .push_submodules()
        .await
        .expect_err("two failures");
    let text = err.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("[lib/a] "));
    assert!(text.contains("[lib/b] [web1] Process exited with status 1"));
}

// ── Build gate ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_build_runs_cmds_behind_guard() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.build().await.expect("build");
    let command = fakes.ssh().commands[0].clone();
    assert!(command.starts_with(&format!("sh -c '{ENV}cd site&&touch .happended&&if [[")));
    assert!(command.ends_with("&&npm install&&make&&echo `git rev-parse HEAD` > .happended'"));
}

#[tokio::test]
async fn test_build_same_commit_twice_is_already_built() {
    let fakes = Fakes::new();
    let mut remote = fakes.remote(host());
    remote.build().await.expect("first build");

    let err = remote.build().await.expect_err("second build");
    assert!(RemoteError::is_already_built(&err));
    assert_eq!(err.to_string(), "[web1] Already completed. Commit again?");
    assert!(
        fakes
            .streams
            .stdout
            .text()
            .contains("[web1] Already completed. Commit again?\n")
    );
    assert_eq!(fakes.ssh().open, 0);
}

#[tokio::test]
async fn test_build_failure_is_not_already_built() {
    let fakes = Fakes::new();
    fakes.ssh().statuses.push_back(1);
    let mut remote = fakes.remote(host());
    let err = remote.build().await.expect_err("build fails");
    assert!(!RemoteError::is_already_built(&err));
    assert!(matches!(
        err.downcast_ref::<RemoteError>(),
        Some(RemoteError::Execution { .. })
    ));
    // A failed build leaves the sentinel unstamped, so it runs again.
    remote.build().await.expect("rebuild");
}

#[tokio::test]
async fn test_build_command_exiting_2_is_execution_failure() {
    // `make` exits 2 on any failed recipe; the gate never printed its line.
    let fakes = Fakes::new();
    fakes.ssh().statuses.push_back(2);
    let mut remote = fakes.remote(host());

    let err = remote.build().await.expect_err("make failed");
    assert!(!RemoteError::is_already_built(&err));
    assert!(matches!(
        err.downcast_ref::<RemoteError>(),
        Some(RemoteError::Execution { .. })
    ));
    assert_eq!(err.to_string(), "[web1] Process exited with status 2");
    assert!(!fakes.streams.stdout.text().contains("Already completed"));
}
