//! Submodule declarations read from `.gitmodules`.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::domain::error::ConfigError;

/// One `[submodule "<name>"]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submodule {
    pub name: String,
    /// Path relative to the superproject root.
    pub path: String,
    pub url: Option<String>,
}

/// Parses `git config --null --get-regexp '^submodule\.'` output.
///
/// Each record is `<key>\n<value>\0`. Keys other than `path` and `url` are
/// ignored. Every submodule must declare a non-empty path.
///
/// # Errors
///
/// Returns `ConfigError::Submodules` for malformed records or modules
/// without a path.
pub fn parse_submodules(raw: &str) -> Result<Vec<Submodule>> {
    let mut paths: BTreeMap<String, Option<String>> = BTreeMap::new();
    let mut urls: BTreeMap<String, String> = BTreeMap::new();

    for record in raw.split('\0').filter(|r| !r.trim().is_empty()) {
        let record = record.trim_start_matches('\n');
        let (key, value) = record.split_once('\n').unwrap_or((record, ""));
        let (name, var) = key
            .strip_prefix("submodule.")
            .and_then(|rest| rest.rsplit_once('.'))
            .ok_or_else(|| ConfigError::Submodules(format!("unexpected key '{key}'")))?;

        match var {
            "path" => {
                paths.insert(name.to_string(), Some(value.to_string()));
            }
            "url" => {
                urls.insert(name.to_string(), value.to_string());
                paths.entry(name.to_string()).or_insert(None);
            }
            _ => {}
        }
    }

    paths
        .into_iter()
        .map(|(name, path)| match path {
            Some(path) if !path.trim().is_empty() => Ok(Submodule {
                url: urls.remove(&name),
                name,
                path,
            }),
            _ => Err(ConfigError::Submodules(format!("submodule '{name}' has no path")).into()),
        })
        .collect()
}
