// ── Runtime configuration ──
//
// These types describe *how* to reach a PRTG server and how the engine
// behaves during a run. They carry credential data and tuning, but never
// touch disk. The CLI constructs them and hands them in.

use secrecy::SecretString;
use url::Url;

use crate::model::PropertySchema;

/// How to authenticate with PRTG.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Account name plus plain password.
    Password {
        username: String,
        password: SecretString,
    },
    /// Account name plus the account's API passhash.
    Passhash {
        username: String,
        passhash: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single PRTG server.
///
/// Built by the CLI, passed to `Controller` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// PRTG web server URL (e.g., `https://prtg.example.com`).
    pub url: Url,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: std::time::Duration,
}

/// Engine behavior for one run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Stop applying at the first remote failure instead of logging and
    /// continuing with the remaining queries.
    pub abort_on_error: bool,
    /// Rows buffered from a bulk import before they are flushed into the store.
    pub import_batch_size: usize,
    /// Which properties are list-typed.
    pub schema: PropertySchema,
}

pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 500;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            abort_on_error: false,
            import_batch_size: DEFAULT_IMPORT_BATCH_SIZE,
            schema: PropertySchema::default(),
        }
    }
}
