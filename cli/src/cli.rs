//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;

/// Provision remote hosts over SSH by pushing git repositories and running
/// build commands once per commit
#[derive(Parser)]
#[command(
    name = "hap",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Hapfile to read hosts and builds from
    #[arg(short, long, global = true, env = "HAP_FILE", value_name = "PATH")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub selection: HostSelection,

    /// Log orchestration details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Which Hapfile hosts a command applies to.
#[derive(Args, Debug, Default, Clone)]
pub struct HostSelection {
    /// Host to act on (repeatable)
    #[arg(short = 'H', long = "host", global = true, value_name = "NAME")]
    pub hosts: Vec<String>,

    /// Act on every host in the Hapfile
    #[arg(short, long, global = true, conflicts_with = "hosts")]
    pub all: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Push the repository and run build commands once per commit
    Build,

    /// Initialize the remote repositories and push to them
    Push,

    /// Run commands in the remote repository directory
    Exec(commands::exec::ExecArgs),

    /// List hosts defined in the Hapfile
    Hosts,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the Hapfile cannot be used or any selected host
    /// fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            file,
            selection,
            verbose: _,
            json,
            quiet,
            no_color,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            file,
        })?;

        match command {
            Command::Build => commands::build::run(&app, &selection).await,
            Command::Push => commands::push::run(&app, &selection).await,
            Command::Exec(args) => commands::exec::run(&app, &selection, &args).await,
            Command::Hosts => commands::hosts::run(&app),
        }
    }
}
