//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use prtgly_config::ConfigError;
use prtgly_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PARTIAL_APPLY: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to PRTG at {url}")]
    #[diagnostic(
        code(prtgly::connection_failed),
        help(
            "Check that the PRTG web server is running and reachable.\n\
             Reason: {reason}\n\
             Try: prtgly status --insecure"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(prtgly::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(prtgly::auth_failed),
        help(
            "Verify the account name and password or passhash.\n\
             Run: prtgly config set-password --profile <name>"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(prtgly::no_credentials),
        help(
            "Configure credentials with: prtgly config init\n\
             Or set PRTGUSERNAME and PRTGPASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Objects ──────────────────────────────────────────────────────

    #[error("PRTG has no {entity_type} '{identifier}'")]
    #[diagnostic(
        code(prtgly::not_found),
        help("Check that the endpoint points at the PRTG web server root")
    )]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Rules & input files ──────────────────────────────────────────

    #[error("Rule #{index} is malformed: {reason}")]
    #[diagnostic(
        code(prtgly::malformed_rule),
        help("Every rule needs at least `name` and `prop`. Rules are numbered from 0.")
    )]
    MalformedRule { index: usize, reason: String },

    #[error("Cannot use rule file {path}")]
    #[diagnostic(code(prtgly::rule_file), help("{reason}"))]
    RuleFile { path: String, reason: String },

    #[error("Import failed at line {line}: {reason}")]
    #[diagnostic(
        code(prtgly::import),
        help("The file needs a header row with at least `type` and `objid` columns.")
    )]
    Import { line: u64, reason: String },

    // ── Apply ────────────────────────────────────────────────────────

    #[error("Changes cannot be applied from an imported file")]
    #[diagnostic(
        code(prtgly::apply_from_import),
        help("Imported objects are preview-only. Drop --source-file to apply against PRTG.")
    )]
    ApplyFromImport,

    #[error("{failed} of {attempted} updates failed")]
    #[diagnostic(
        code(prtgly::partial_apply),
        help("Failed updates are logged with object id and property. Fix them and run apply again.")
    )]
    PartialApply { failed: usize, attempted: usize },

    #[error("Aborted: setting {property} on object {object_id} failed: {message}")]
    #[diagnostic(
        code(prtgly::apply_aborted),
        help("Remaining updates were not sent. Drop --abort-on-error to continue past failures.")
    )]
    ApplyAborted {
        object_id: u64,
        property: String,
        message: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(code(prtgly::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(prtgly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(prtgly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: prtgly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(prtgly::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(prtgly::output))]
    Output { message: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(prtgly::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PartialApply { .. } | Self::ApplyAborted { .. } => exit_code::PARTIAL_APPLY,
            Self::Validation { .. } | Self::ApplyFromImport | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                entity_type,
                identifier,
            },
            CoreError::MalformedRule { index, reason } => Self::MalformedRule { index, reason },
            CoreError::RuleFile { path, reason } => Self::RuleFile { path, reason },
            CoreError::Import { line, reason } => Self::Import { line, reason },
            CoreError::RemoteApply {
                object_id,
                property,
                message,
            } => Self::ApplyAborted {
                object_id,
                property,
                message,
            },
            CoreError::ApplyFromImport => Self::ApplyFromImport,
            CoreError::Api { message, .. } => Self::ApiError { message },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Io(e) => Self::Io(e),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Io(e) => Self::Io(e),
            other @ (ConfigError::Keyring(_)
            | ConfigError::Serialization(_)
            | ConfigError::Figment(_)) => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
