//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::AnonymizeConfig;
use crate::domain::errors::AnonError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AnonymizeConfig
/// 4. Applies environment variable overrides (PBS_ANON_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use pbs_anonymize::config::loader::load_config;
///
/// let config = load_config("pbs-anonymize.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AnonymizeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AnonError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AnonError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Loads the configuration at `path`, or defaults when the file is absent
///
/// Environment overrides and validation apply either way.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<AnonymizeConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "No configuration file, using defaults");
    let mut config = AnonymizeConfig::default();
    finish(&mut config)?;
    Ok(config)
}

/// Parses configuration text
pub fn parse_config(contents: &str) -> Result<AnonymizeConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AnonymizeConfig = toml::from_str(&contents)
        .map_err(|e| AnonError::Configuration(format!("Failed to parse TOML: {e}")))?;

    finish(&mut config)?;
    Ok(config)
}

fn finish(config: &mut AnonymizeConfig) -> Result<()> {
    apply_env_overrides(config)?;

    config.validate().map_err(|e| {
        AnonError::Configuration(format!("Configuration validation failed: {e}"))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut lines = Vec::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        // Comments may mention ${VAR} without it being set
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(AnonError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    let mut result = lines.join("\n");
    if input.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}

/// Applies environment variable overrides using the PBS_ANON_* prefix
///
/// Anonymization overrides are handled by
/// [`AnonymizationConfig::apply_env_overrides`](crate::anonymization::AnonymizationConfig::apply_env_overrides).
fn apply_env_overrides(config: &mut AnonymizeConfig) -> Result<()> {
    if let Ok(val) = std::env::var("PBS_ANON_LOG_LEVEL") {
        config.application.log_level = val;
    }

    config
        .anonymization
        .apply_env_overrides()
        .map_err(|e| AnonError::Configuration(format!("{e:#}")))?;

    if let Ok(val) = std::env::var("PBS_ANON_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("PBS_ANON_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("PBS_ANON_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
