//! Shared configuration for prtgly.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `prtgly_core::ControllerConfig` / `EngineConfig`.
//! The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use prtgly_core::{
    AuthCredentials, ControllerConfig, EngineConfig, PropertySchema, TlsVerification,
};

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "prtgly";

/// Variables honored for compatibility with existing PRTG tooling.
pub const ENV_ENDPOINT: &str = "PRTGENDPOINT";
pub const ENV_USERNAME: &str = "PRTGUSERNAME";
pub const ENV_PASSWORD: &str = "PRTGPASSWORD";

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";
pub const DEFAULT_USERNAME: &str = "prtgadmin";
pub const DEFAULT_PASSWORD: &str = "prtgadmin";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named PRTG server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub abort_on_error: bool,

    #[serde(default = "default_import_batch_size")]
    pub import_batch_size: usize,

    #[serde(default = "default_list_properties")]
    pub list_properties: Vec<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            format: default_format(),
            insecure: false,
            timeout: default_timeout(),
            abort_on_error: false,
            import_batch_size: default_import_batch_size(),
            list_properties: default_list_properties(),
        }
    }
}

fn default_format() -> String {
    "pretty".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_import_batch_size() -> usize {
    prtgly_core::config::DEFAULT_IMPORT_BATCH_SIZE
}
fn default_list_properties() -> Vec<String> {
    vec!["tags".into()]
}

/// A named PRTG server profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// PRTG web server URL (e.g., "https://prtg.example.com").
    pub endpoint: String,

    /// Account name.
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// API passhash, used when no password resolves.
    pub passhash: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override abort-on-error.
    pub abort_on_error: Option<bool>,

    /// Override import batch size.
    pub import_batch_size: Option<usize>,

    /// Override which properties are list-typed.
    pub list_properties: Option<Vec<String>>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "prtgly", "prtgly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("prtgly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path`, layered over defaults and under `PRTGLY_*` env.
///
/// Nested keys use a double underscore: `PRTGLY_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PRTGLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Remove a profile's password from the system keyring.
pub fn forget_password(profile_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(profile_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the account name: profile, then `PRTGUSERNAME`.
pub fn resolve_username(profile: &Profile) -> Option<String> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(ENV_USERNAME).ok())
}

/// Resolve `AuthCredentials` for a profile.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<AuthCredentials, ConfigError> {
    let username = resolve_username(profile).ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })?;
    resolve_credentials_for(profile, profile_name, username)
}

/// Resolve the secret half of a profile's credentials for `username`.
///
/// Password lookup order: `PRTGPASSWORD`, keyring, plaintext password.
/// A plaintext passhash is used only when no password resolves.
pub fn resolve_credentials_for(
    profile: &Profile,
    profile_name: &str,
    username: String,
) -> Result<AuthCredentials, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(ENV_PASSWORD) {
        return Ok(AuthCredentials::Password {
            username,
            password: SecretString::from(pw),
        });
    }

    // 2. Keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(AuthCredentials::Password {
                username,
                password: SecretString::from(pw),
            });
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(AuthCredentials::Password {
            username,
            password: SecretString::from(pw.clone()),
        });
    }
    if let Some(ref hash) = profile.passhash {
        return Ok(AuthCredentials::Passhash {
            username,
            passhash: SecretString::from(hash.clone()),
        });
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Parse an endpoint string into a URL.
pub fn parse_endpoint(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "endpoint".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `ControllerConfig` from a profile -- no CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = parse_endpoint(&profile.endpoint)?;
    let auth = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ControllerConfig {
        url,
        auth,
        tls,
        timeout,
    })
}

/// Engine behavior from defaults, overridden per profile.
pub fn engine_config(defaults: &Defaults, profile: Option<&Profile>) -> EngineConfig {
    let list_properties = profile
        .and_then(|p| p.list_properties.as_ref())
        .unwrap_or(&defaults.list_properties);

    EngineConfig {
        abort_on_error: profile
            .and_then(|p| p.abort_on_error)
            .unwrap_or(defaults.abort_on_error),
        import_batch_size: profile
            .and_then(|p| p.import_batch_size)
            .unwrap_or(defaults.import_batch_size)
            .max(1),
        schema: PropertySchema::new(list_properties.iter().map(String::as_str)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 45
list_properties = ["tags", "comments"]

[profiles.lab]
endpoint = "https://prtg.lab.example"
username = "ops"
passhash = "12345"
abort_on_error = true

[profiles.prod]
endpoint = "not a url"
"#;

    #[test]
    fn loads_profiles_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.timeout, 45);
        assert_eq!(cfg.defaults.format, "pretty");
        assert_eq!(cfg.defaults.import_batch_size, 500);
        assert_eq!(cfg.profiles["lab"].username.as_deref(), Some("ops"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.defaults.list_properties, vec!["tags".to_owned()]);
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                endpoint: "http://10.0.0.5".into(),
                username: Some("prtgadmin".into()),
                import_batch_size: Some(100),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["home"].endpoint, "http://10.0.0.5");
        assert_eq!(loaded.profiles["home"].import_batch_size, Some(100));
    }

    #[test]
    fn engine_config_prefers_profile_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = load_config_from(&path).unwrap();

        let engine = engine_config(&cfg.defaults, cfg.profiles.get("lab"));
        assert!(engine.abort_on_error);
        assert_eq!(engine.import_batch_size, 500);
        assert!(engine.schema.is_list("comments"));

        let plain = engine_config(&Defaults::default(), None);
        assert!(!plain.abort_on_error);
        assert!(plain.schema.is_list("tags"));
        assert!(!plain.schema.is_list("comments"));
    }

    #[test]
    fn passhash_profile_translates() {
        let profile = Profile {
            endpoint: "https://prtg.lab.example".into(),
            username: Some("ops".into()),
            passhash: Some("12345".into()),
            timeout: Some(5),
            ..Profile::default()
        };
        // An exported PRTGPASSWORD takes precedence over the passhash.
        if std::env::var(ENV_PASSWORD).is_ok() {
            return;
        }

        let cc = profile_to_controller_config(&profile, "prtgly-test-lab", &Defaults::default())
            .unwrap();
        assert_eq!(cc.url.as_str(), "https://prtg.lab.example/");
        assert_eq!(cc.timeout, Duration::from_secs(5));
        assert_eq!(cc.tls, TlsVerification::SystemDefaults);
        match cc.auth {
            AuthCredentials::Passhash { username, passhash } => {
                assert_eq!(username, "ops");
                assert_eq!(passhash.expose_secret(), "12345");
            }
            other @ AuthCredentials::Password { .. } => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_endpoint_is_a_validation_error() {
        let profile = Profile {
            endpoint: "not a url".into(),
            username: Some("ops".into()),
            password: Some("pw".into()),
            ..Profile::default()
        };
        let err = profile_to_controller_config(&profile, "prod", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "endpoint"));
    }

    #[test]
    fn insecure_default_applies_without_profile_override() {
        let defaults = Defaults {
            insecure: true,
            ..Defaults::default()
        };
        let profile = Profile {
            endpoint: "https://prtg.lab.example".into(),
            username: Some("ops".into()),
            password: Some("pw".into()),
            ..Profile::default()
        };
        let cc = profile_to_controller_config(&profile, "prtgly-test-insecure", &defaults).unwrap();
        assert_eq!(cc.tls, TlsVerification::DangerAcceptInvalid);
    }
}
