//! Shared helpers for command handlers.

use std::io::IsTerminal;

use redirectctl_core::ManagedEntry;

use crate::cli::EntryArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, refuses instead of hanging.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Split entry flags into the tracked name and the declared entry.
///
/// Without `--name` the entry is keyed by its own identity
/// (`{app_id}#{redirect_uri}`), so declaring a second URI on the same
/// application tracks a second entry instead of moving the first.
pub fn entry_from_args(args: EntryArgs) -> (String, ManagedEntry) {
    let entry = ManagedEntry::new(args.app_id, args.redirect_uri);
    let name = args.name.unwrap_or_else(|| entry.to_string());
    (name, entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(uri: &str, name: Option<&str>) -> EntryArgs {
        EntryArgs {
            app_id: "app-1".into(),
            redirect_uri: uri.into(),
            name: name.map(str::to_owned),
        }
    }

    #[test]
    fn default_name_is_entry_identity() {
        let (a, _) = entry_from_args(args("https://a/cb", None));
        let (b, _) = entry_from_args(args("https://b/cb", None));
        assert_eq!(a, "app-1#https://a/cb");
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_name_wins() {
        let (name, entry) = entry_from_args(args("https://b/cb", Some("portal")));
        assert_eq!(name, "portal");
        assert_eq!(entry.redirect_uri, "https://b/cb");
    }
}
