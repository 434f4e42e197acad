//! Local state file: which entries are tracked, and what was last observed.
//!
//! JSON on disk, keyed by entry name. Each value is the `ObservedState`
//! returned by the last successful reconciliation, so the previously
//! managed URI is always known when the declaration changes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use redirectctl_core::ObservedState;

use crate::error::CliError;

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, ObservedState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Read `path`. A missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let state: Self = serde_json::from_str(&raw).map_err(|e| CliError::State {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if state.version != STATE_VERSION {
            return Err(CliError::State {
                path: path.display().to_string(),
                reason: format!(
                    "unsupported version {} (expected {STATE_VERSION})",
                    state.version
                ),
            });
        }
        Ok(state)
    }

    /// Write via a sibling temp file so a crash never leaves half a file.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "state saved");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ObservedState> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: String, observed: ObservedState) {
        self.entries.insert(name, observed);
    }

    pub fn remove(&mut self, name: &str) -> Option<ObservedState> {
        self.entries.remove(name)
    }

    /// Tracked entries, or only `name` when given.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<(String, ObservedState)>, CliError> {
        match name {
            Some(name) => {
                let observed = self.get(name).ok_or_else(|| CliError::Untracked {
                    name: name.to_owned(),
                })?;
                Ok(vec![(name.to_owned(), observed.clone())])
            }
            None => Ok(self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
        }
    }
}
