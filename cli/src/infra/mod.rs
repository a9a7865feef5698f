//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the git
//! CLI, SSH transport, key resolution and Hapfile loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod git;
pub mod hapfile;
pub mod keys;
pub mod ssh;
