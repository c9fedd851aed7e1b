//! Config subcommand handlers.

use std::collections::HashMap;
use std::fmt::Write as _;

use dialoguer::{Input, Password, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const SETTABLE_KEYS: &str = "endpoint, username, passhash, ca_cert, insecure, timeout, \
                             abort_on_error, import_batch_size, list_properties";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config as TOML-ish text, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "format = \"{}\"", d.format);
    let _ = writeln!(out, "insecure = {}", d.insecure);
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "abort_on_error = {}", d.abort_on_error);
    let _ = writeln!(out, "import_batch_size = {}", d.import_batch_size);
    let _ = writeln!(out, "list_properties = {:?}", d.list_properties);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "endpoint = \"{}\"", p.endpoint);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if p.passhash.is_some() {
            let _ = writeln!(out, "passhash = \"****\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(abort) = p.abort_on_error {
            let _ = writeln!(out, "abort_on_error = {abort}");
        }
        if let Some(size) = p.import_batch_size {
            let _ = writeln!(out, "import_batch_size = {size}");
        }
        if let Some(ref props) = p.list_properties {
            let _ = writeln!(out, "list_properties = {props:?}");
        }
    }

    out.trim_end().to_owned()
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.format {
                OutputFormat::Pretty | OutputFormat::Csv => format_config_redacted(&cfg),
                OutputFormat::Json | OutputFormat::Yaml => {
                    let mut redacted = serde_json::to_value(&cfg).map_err(|e| CliError::Output {
                        message: e.to_string(),
                    })?;
                    if let Some(profiles) = redacted
                        .get_mut("profiles")
                        .and_then(serde_json::Value::as_object_mut)
                    {
                        for profile in profiles.values_mut().filter_map(serde_json::Value::as_object_mut) {
                            for secret in ["password", "passhash"] {
                                if profile.get(secret).is_some_and(|v| !v.is_null()) {
                                    profile.insert(secret.into(), "****".into());
                                }
                            }
                        }
                    }
                    if global.format == OutputFormat::Json {
                        serde_json::to_string_pretty(&redacted)
                            .map_err(|e| CliError::Output { message: e.to_string() })?
                    } else {
                        serde_yaml::to_string(&redacted)
                            .map_err(|e| CliError::Output { message: e.to_string() })?
                    }
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "endpoint" => {
                    prtgly_config::parse_endpoint(&value)?;
                    profile.endpoint = value;
                }
                "username" => profile.username = Some(value),
                "passhash" => profile.passhash = Some(value),
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                "insecure" => {
                    profile.insecure = Some(parse_field("insecure", &value, "'true' or 'false'")?);
                }
                "timeout" => {
                    profile.timeout = Some(parse_field("timeout", &value, "a number (seconds)")?);
                }
                "abort_on_error" | "abort-on-error" => {
                    profile.abort_on_error =
                        Some(parse_field("abort_on_error", &value, "'true' or 'false'")?);
                }
                "import_batch_size" | "import-batch-size" => {
                    let size: usize = parse_field("import_batch_size", &value, "a positive number")?;
                    if size == 0 {
                        return Err(CliError::Validation {
                            field: "import_batch_size".into(),
                            reason: "must be a positive number".into(),
                        });
                    }
                    profile.import_batch_size = Some(size);
                }
                "list_properties" | "list-properties" => {
                    profile.list_properties = Some(
                        value
                            .split([',', ' '])
                            .filter(|s| !s.is_empty())
                            .map(str::to_owned)
                            .collect(),
                    );
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
                    });
                }
            }

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: prtgly config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── Keyring ────────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let password = Password::new()
                .with_prompt(format!("Password for profile '{profile_name}'"))
                .interact()
                .map_err(prompt_err)?;
            prtgly_config::store_password(&profile_name, &password)?;
            eprintln!("✓ Password stored in system keyring for '{profile_name}'");
            Ok(())
        }

        ConfigCommand::ForgetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            prtgly_config::forget_password(&profile_name)?;
            eprintln!("✓ Keyring entry removed for '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("prtgly configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let endpoint: String = Input::new()
        .with_prompt("PRTG server URL")
        .default(prtgly_config::DEFAULT_ENDPOINT.into())
        .validate_with(|input: &String| {
            prtgly_config::parse_endpoint(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("Account name")
        .default(prtgly_config::DEFAULT_USERNAME.into())
        .interact_text()
        .map_err(prompt_err)?;

    let auth_choices = &[
        "Password, stored in system keyring (recommended)",
        "Password, saved to config file (plaintext)",
        "Passhash, saved to config file",
    ];
    let auth_selection = Select::new()
        .with_prompt("Authentication")
        .items(auth_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let secret = Password::new()
        .with_prompt(if auth_selection == 2 { "Passhash" } else { "Password" })
        .interact()
        .map_err(prompt_err)?;

    let (password, passhash) = match auth_selection {
        0 => {
            prtgly_config::store_password(&profile_name, &secret)?;
            eprintln!("   ✓ Password stored in system keyring");
            (None, None)
        }
        1 => (Some(secret), None),
        _ => (None, Some(secret)),
    };

    let profile = Profile {
        endpoint,
        username: Some(username),
        password,
        passhash,
        ..Profile::default()
    };

    let mut profiles = HashMap::new();
    profiles.insert(profile_name.clone(), profile);

    let cfg = Config {
        default_profile: Some(profile_name.clone()),
        profiles,
        ..Config::default()
    };

    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: prtgly status");
    Ok(())
}

#[cfg(test)]
mod tests {
    use prtgly_config::Defaults;

    use super::*;

    #[test]
    fn redacted_config_masks_secrets() {
        let mut cfg = Config {
            defaults: Defaults::default(),
            ..Config::default()
        };
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                endpoint: "https://prtg.lab.example".into(),
                username: Some("ops".into()),
                password: Some("hunter2".into()),
                passhash: Some("12345".into()),
                ..Profile::default()
            },
        );

        let text = format_config_redacted(&cfg);
        assert!(text.contains("[profiles.lab]"));
        assert!(text.contains("password = \"****\""));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("12345"));
    }
}
