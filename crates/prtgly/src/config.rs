//! CLI configuration -- thin wrapper around `prtgly_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--endpoint,
//! --username, --password, ...). Core never sees these types.

use std::time::Duration;

use secrecy::SecretString;

use prtgly_config::{ConfigError, DEFAULT_ENDPOINT, DEFAULT_PASSWORD, DEFAULT_USERNAME};
use prtgly_core::{AuthCredentials, ControllerConfig, EngineConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use prtgly_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile, if one is configured.
///
/// An explicitly requested profile that does not exist is an error; a
/// missing default profile just means flags, env and built-in defaults.
fn active_profile<'a>(
    global: &GlobalOpts,
    config: &'a Config,
) -> Result<Option<(&'a Profile, String)>, CliError> {
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => Ok(Some((profile, name))),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            })
        }
        None => Ok(None),
    }
}

/// Engine settings from the config file, before command flags.
pub fn resolve_engine(global: &GlobalOpts, config: &Config) -> Result<EngineConfig, CliError> {
    let profile = active_profile(global, config)?;
    Ok(prtgly_config::engine_config(
        &config.defaults,
        profile.map(|(p, _)| p),
    ))
}

/// Translate profile + global flags into a `ControllerConfig`.
///
/// Precedence: flag / legacy env var, then profile, then built-in defaults.
pub fn resolve_controller(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ControllerConfig, CliError> {
    let active = active_profile(global, config)?;
    let profile = active.as_ref().map(|(p, _)| *p);

    // 1. Endpoint
    let endpoint = global
        .endpoint
        .as_deref()
        .or_else(|| profile.map(|p| p.endpoint.as_str()))
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_ENDPOINT);
    let url = prtgly_config::parse_endpoint(endpoint)?;

    // 2. Credentials
    let auth = resolve_auth(global, active)?;

    // 3. TLS verification
    let insecure = global.insecure
        || profile
            .and_then(|p| p.insecure)
            .unwrap_or(config.defaults.insecure);
    let tls = if insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca_path) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca_path)
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Timeout
    let timeout = global
        .timeout
        .or_else(|| profile.and_then(|p| p.timeout))
        .unwrap_or(config.defaults.timeout);

    Ok(ControllerConfig {
        url,
        auth,
        tls,
        timeout: Duration::from_secs(timeout),
    })
}

fn resolve_auth(
    global: &GlobalOpts,
    profile: Option<(&Profile, String)>,
) -> Result<AuthCredentials, CliError> {
    let username = global
        .username
        .clone()
        .or_else(|| profile.as_ref().and_then(|(p, _)| p.username.clone()))
        .unwrap_or_else(|| DEFAULT_USERNAME.into());

    // Flags (and PRTGPASSWORD / PRTGPASSHASH through clap) win.
    if let Some(ref password) = global.password {
        return Ok(AuthCredentials::Password {
            username,
            password: SecretString::from(password.clone()),
        });
    }
    if let Some(ref passhash) = global.passhash {
        return Ok(AuthCredentials::Passhash {
            username,
            passhash: SecretString::from(passhash.clone()),
        });
    }

    if let Some((profile, name)) = profile {
        match prtgly_config::resolve_credentials_for(profile, &name, username.clone()) {
            Ok(auth) => return Ok(auth),
            Err(ConfigError::NoCredentials { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(AuthCredentials::Password {
        username,
        password: SecretString::from(DEFAULT_PASSWORD),
    })
}
