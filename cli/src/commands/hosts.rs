//! `hap hosts` — list the hosts a Hapfile defines.

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::{Auth, Host};
use crate::output::json;

/// Print every resolved host.
///
/// # Errors
///
/// Returns an error if the Hapfile cannot be loaded or a host does not
/// resolve.
pub fn run(app: &AppContext) -> Result<()> {
    let hosts = app.load_hapfile()?.hosts()?;

    if app.is_json() {
        println!("{}", json::format_hosts(&hosts)?);
        return Ok(());
    }

    for host in &hosts {
        print_host(app, host);
    }
    Ok(())
}

fn print_host(app: &AppContext, host: &Host) {
    let out = &app.output;
    out.header(&host.name);
    out.kv("addr", &host.addr);
    out.kv("username", &host.username);
    match &host.auth {
        Auth::Identity(path) => out.kv("identity", &path.display().to_string()),
        Auth::Password(_) => out.kv("auth", "password"),
    }
    for cmd in host.cmds() {
        out.kv("cmd", &cmd);
    }
}
