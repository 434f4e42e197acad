//! Clap derive structures for the `redirectctl` CLI.
//!
//! Defines the command tree, global flags, and shared types. Only depends on
//! clap so `build.rs` can compile it for man pages and completions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// redirectctl -- declarative redirect URIs for Entra ID applications
#[derive(Debug, Parser)]
#[command(
    name = "redirectctl",
    version,
    about = "Declare and reconcile application redirect URIs in Microsoft Entra ID",
    long_about = "Manages single redirect URIs in an application's web.redirectUris through \
        Microsoft Graph.\n\n\
        Graph only replaces whole applications, so every change is a \
        fetch-modify-write guarded against concurrent edits. Tracked entries \
        and their last observed state live in a local state file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "REDIRECTCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "REDIRECTCTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory (tenant) ID (overrides profile)
    #[arg(long, env = "REDIRECTCTL_TENANT_ID", global = true)]
    pub tenant_id: Option<String>,

    /// Client ID used to authenticate (overrides profile)
    #[arg(long, env = "REDIRECTCTL_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Client secret
    #[arg(long, env = "REDIRECTCTL_CLIENT_SECRET", global = true, hide_env = true)]
    pub client_secret: Option<String>,

    /// Token endpoint host (sovereign clouds, testing)
    #[arg(long, env = "REDIRECTCTL_AUTH_HOST", global = true)]
    pub auth_host: Option<String>,

    /// Graph host (sovereign clouds, testing)
    #[arg(long, env = "REDIRECTCTL_GRAPH_HOST", global = true)]
    pub graph_host: Option<String>,

    /// State file tracking managed entries
    #[arg(long, env = "REDIRECTCTL_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Output format [default: `defaults.output` from config, else table]
    #[arg(long, short = 'o', env = "REDIRECTCTL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: `defaults.color` from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "REDIRECTCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Write attempts before giving up on a concurrently modified application
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// How an update replaces the old URI
    #[arg(long, global = true)]
    pub update_strategy: Option<UpdateStrategyArg>,
}

impl GlobalOpts {
    /// Output format after flag, env, and config defaults were applied.
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or_default()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or_default()
    }
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Default, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UpdateStrategyArg {
    /// Remove the old URI and add the new one in a single write
    SingleReplace,
    /// Remove, then add, in two writes (briefly holds neither URI)
    TwoPhase,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up an application and its redirect URIs
    #[command(alias = "get")]
    Show(ShowArgs),

    /// Converge a redirect URI: add it, or replace the tracked one
    Apply(EntryArgs),

    /// Compare tracked entries with live state without changing anything
    Plan(SelectArgs),

    /// Re-read tracked entries and record what changed remotely
    Refresh(SelectArgs),

    /// Start tracking a redirect URI that already exists
    Import(EntryArgs),

    /// Remove a redirect URI and stop tracking it
    #[command(alias = "rm")]
    Destroy(EntryArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Application (client) ID to look up
    #[arg(long)]
    pub app_id: String,
}

/// One managed redirect URI.
#[derive(Debug, Args)]
pub struct EntryArgs {
    /// Application (client) ID that owns the redirect URI
    #[arg(long)]
    pub app_id: String,

    /// Redirect URI to manage
    #[arg(long)]
    pub redirect_uri: String,

    /// Name this entry is tracked under (defaults to `APP_ID#REDIRECT_URI`)
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Only this tracked entry
    pub name: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config and state file locations
    Path,

    /// Store a profile's client secret in the system keyring
    SetSecret {
        /// Profile name (defaults to active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
