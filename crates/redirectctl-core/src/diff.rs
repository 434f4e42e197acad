// Collection diffing for drift reports.

use serde::{Deserialize, Serialize};

use crate::presence;

/// Values that appeared in or disappeared from a redirect list between two
/// observations. Order follows the list each value was found in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl CollectionDiff {
    pub fn between(previous: &[String], current: &[String]) -> Self {
        let added = current
            .iter()
            .filter(|v| !presence::contains(previous, v))
            .cloned()
            .collect();
        let removed = previous
            .iter()
            .filter(|v| !presence::contains(current, v))
            .cloned()
            .collect();
        Self { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl std::fmt::Display for CollectionDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("no changes");
        }
        let parts: Vec<String> = self
            .added
            .iter()
            .map(|v| format!("+{v}"))
            .chain(self.removed.iter().map(|v| format!("-{v}")))
            .collect();
        f.write_str(&parts.join(", "))
    }
}
