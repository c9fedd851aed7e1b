// ── Core error types ──
//
// User-facing errors from prtgly-core. Consumers never see raw HTTP
// status handling or JSON decoding; the `From<prtgly_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::model::ObjectId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to PRTG at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("PRTG request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Rule errors ──────────────────────────────────────────────────
    #[error("Rule #{index} is malformed: {reason}")]
    MalformedRule { index: usize, reason: String },

    #[error("Cannot read rule file {path}: {reason}")]
    RuleFile { path: String, reason: String },

    // ── Import errors ────────────────────────────────────────────────
    #[error("Import failed at line {line}: {reason}")]
    Import { line: u64, reason: String },

    // ── Apply errors ─────────────────────────────────────────────────
    #[error("Failed to set '{property}' on object {object_id}: {message}")]
    RemoteApply {
        object_id: ObjectId,
        property: String,
        message: String,
    },

    #[error("Changes cannot be applied when entities come from an import file")]
    ApplyFromImport,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Translate an API error, reporting HTTP 404 as a missing
    /// `entity_type` named `identifier`.
    pub(crate) fn not_found_or(
        err: prtgly_api::Error,
        entity_type: &str,
        identifier: &str,
    ) -> Self {
        match err {
            prtgly_api::Error::Http { status: 404, .. } => CoreError::NotFound {
                entity_type: entity_type.to_owned(),
                identifier: identifier.to_owned(),
            },
            other => other.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<prtgly_api::Error> for CoreError {
    fn from(err: prtgly_api::Error) -> Self {
        match err {
            prtgly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            prtgly_api::Error::Transport(e) => {
                // Request URLs carry credentials in the query string.
                let url = e.url().map_or_else(|| "<unknown>".into(), without_query);
                let e = e.without_url();
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            prtgly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            prtgly_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            prtgly_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            prtgly_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

/// Render a request URL with its query string (and credentials) removed.
fn without_query(url: &url::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
