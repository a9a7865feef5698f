//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod command;
pub mod error;
pub mod hapfile;
pub mod host;
pub mod submodule;

pub use error::{ConfigError, RemoteError};
pub use hapfile::Hapfile;
pub use host::{Auth, Host, RepositoryBinding, SshCredentials};
pub use submodule::Submodule;
