//! Clap derive structures for the `prtgly` CLI.
//!
//! Defines the command tree, global flags, and shared types. Kept free of
//! workspace crates so `build.rs` can include it for man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// prtgly -- rule-driven property management for PRTG
#[derive(Debug, Parser)]
#[command(
    name = "prtgly",
    version,
    about = "Manage PRTG object properties from declarative rules",
    long_about = "Loads groups, devices and sensors from a PRTG server (or a CSV export),\n\
        matches them against a YAML rule file, and computes the property updates\n\
        needed so children inherit list values such as tags from their parents.\n\n\
        Preview first, then apply.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "PRTGLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// PRTG server URL (overrides profile)
    #[arg(long, short = 'e', env = "PRTGENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// PRTG account name
    #[arg(long, short = 'u', env = "PRTGUSERNAME", global = true)]
    pub username: Option<String>,

    /// PRTG account password
    #[arg(long, env = "PRTGPASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// PRTG account passhash (instead of a password)
    #[arg(
        long,
        env = "PRTGPASSHASH",
        global = true,
        hide_env_values = true,
        conflicts_with = "password"
    )]
    pub passhash: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'f',
        env = "PRTGLY_FORMAT",
        default_value = "pretty",
        global = true
    )]
    pub format: OutputFormat,

    /// Sort the pretty table by this column
    #[arg(long, global = true)]
    pub sort_by: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PRTGLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PRTGLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Content Enums ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table (default, interactive)
    Pretty,
    /// Comma-separated values with a sorted header row
    Csv,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContentArg {
    /// Groups and probes
    #[value(alias = "group")]
    Groups,
    /// Devices
    #[value(alias = "device")]
    Devices,
    /// Sensors
    #[value(alias = "sensor")]
    Sensors,
    /// Groups, devices and sensors
    All,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List objects as PRTG reports them
    Ls(SourceArgs),

    /// Show PRTG server status
    Status,

    /// Show every selected object as it would look after the rules run
    Preview(RunArgs),

    /// Show only the objects the rules would change
    PreviewChangedOnly(RunArgs),

    /// Run the rules and push the resulting property changes to PRTG
    Apply(ApplyArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Which objects to act on and where they come from.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Content to act on
    #[arg(long, short = 'c', value_enum, default_value = "devices")]
    pub content: ContentArg,

    /// Read objects from a CSV export instead of the PRTG API
    #[arg(long, short = 's', value_name = "FILE")]
    pub source_file: Option<PathBuf>,
}

/// Rule evaluation arguments.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Rule file (YAML)
    #[arg(long, short = 'r', value_name = "FILE", default_value = "rules.yaml")]
    pub rules: PathBuf,

    /// Print every generated query before the report
    #[arg(long)]
    pub show_queries: bool,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Stop at the first failed update instead of continuing
    #[arg(long)]
    pub abort_on_error: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "endpoint", "username", "timeout")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,

    /// Remove the active profile's password from the system keyring
    ForgetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
