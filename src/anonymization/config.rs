//! Anonymization configuration

use crate::anonymization::engine::{Anonymizer, SpecSet};
use crate::anonymization::spec::{RawSpec, Spec};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to anonymize and where the output goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Attributes to delete
    #[serde(default)]
    pub attr_delete: Option<RawSpec>,

    /// Resources to delete
    #[serde(default)]
    pub resc_delete: Option<RawSpec>,

    /// Attributes whose names are anonymized
    #[serde(default)]
    pub attr_key: Option<RawSpec>,

    /// Attributes whose values are anonymized
    #[serde(default)]
    pub attr_val: Option<RawSpec>,

    /// Resources whose names are anonymized
    #[serde(default)]
    pub resc_key: Option<RawSpec>,

    /// Resources whose values are anonymized
    #[serde(default)]
    pub resc_val: Option<RawSpec>,

    /// Suffix appended to rewritten file names
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Overwrite input files instead of writing `<file><suffix>`
    #[serde(default)]
    pub inplace: bool,

    /// Fixed seed for reproducible pseudonyms
    #[serde(default)]
    pub seed: Option<u64>,

    /// Where to write the JSON mapping dump at the end of a run
    #[serde(default)]
    pub mapping_dump: Option<PathBuf>,

    /// Show SHA-256 digests instead of originals in the text dump
    #[serde(default)]
    pub hash_originals: bool,

    /// Audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_output_suffix() -> String {
    ".anon".to_string()
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            attr_delete: None,
            resc_delete: None,
            attr_key: None,
            attr_val: None,
            resc_key: None,
            resc_val: None,
            output_suffix: default_output_suffix(),
            inplace: false,
            seed: None,
            mapping_dump: None,
            hash_originals: false,
            audit: AuditConfig::default(),
        }
    }
}

impl AnonymizationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.inplace && self.output_suffix.is_empty() {
            anyhow::bail!("output_suffix must not be empty unless inplace is set");
        }

        if let Some(ref path) = self.mapping_dump {
            if path.as_os_str().is_empty() {
                anyhow::bail!("mapping_dump path must not be empty");
            }
        }

        self.audit.validate().context("Invalid audit configuration")?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let spec_vars: [(&str, &mut Option<RawSpec>); 6] = [
            ("PBS_ANON_ATTR_DELETE", &mut self.attr_delete),
            ("PBS_ANON_RESC_DELETE", &mut self.resc_delete),
            ("PBS_ANON_ATTR_KEY", &mut self.attr_key),
            ("PBS_ANON_ATTR_VAL", &mut self.attr_val),
            ("PBS_ANON_RESC_KEY", &mut self.resc_key),
            ("PBS_ANON_RESC_VAL", &mut self.resc_val),
        ];
        for (var, slot) in spec_vars {
            if let Ok(val) = std::env::var(var) {
                *slot = Some(RawSpec::Text(val));
            }
        }

        if let Ok(val) = std::env::var("PBS_ANON_OUTPUT_SUFFIX") {
            self.output_suffix = val;
        }

        if let Ok(val) = std::env::var("PBS_ANON_INPLACE") {
            self.inplace = val.parse().context("Invalid PBS_ANON_INPLACE value")?;
        }

        if let Ok(val) = std::env::var("PBS_ANON_SEED") {
            self.seed = Some(val.parse().context("Invalid PBS_ANON_SEED value")?);
        }

        if let Ok(val) = std::env::var("PBS_ANON_MAPPING_DUMP") {
            self.mapping_dump = Some(PathBuf::from(val));
        }

        self.audit.apply_env_overrides()?;

        Ok(())
    }

    /// Normalize the six specifications
    ///
    /// Unusable specifications are logged and treated as empty.
    pub fn spec_set(&self) -> SpecSet {
        SpecSet {
            attr_delete: Spec::from_raw("attr_delete", self.attr_delete.as_ref()),
            resc_delete: Spec::from_raw("resc_delete", self.resc_delete.as_ref()),
            attr_key: Spec::from_raw("attr_key", self.attr_key.as_ref()),
            attr_val: Spec::from_raw("attr_val", self.attr_val.as_ref()),
            resc_key: Spec::from_raw("resc_key", self.resc_key.as_ref()),
            resc_val: Spec::from_raw("resc_val", self.resc_val.as_ref()),
        }
    }

    /// Start a new session from this configuration
    pub fn build_session(&self) -> Anonymizer {
        let specs = self.spec_set();
        match self.seed {
            Some(seed) => Anonymizer::with_seed(specs, seed),
            None => Anonymizer::new(specs),
        }
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_audit_json_format")]
    pub json_format: bool,
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/anonymize.log")
}

fn default_audit_json_format() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: default_audit_json_format(),
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            if let Some(parent) = self.log_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create audit log directory: {}", parent.display())
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("PBS_ANON_AUDIT_ENABLED") {
            self.enabled = val
                .parse()
                .context("Invalid PBS_ANON_AUDIT_ENABLED value")?;
        }

        if let Ok(val) = std::env::var("PBS_ANON_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("PBS_ANON_AUDIT_JSON_FORMAT") {
            self.json_format = val
                .parse()
                .context("Invalid PBS_ANON_AUDIT_JSON_FORMAT value")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnonymizationConfig::default();
        assert_eq!(config.output_suffix, ".anon");
        assert!(!config.inplace);
        assert!(config.seed.is_none());
        assert!(!config.audit.enabled);
        assert!(config.audit.json_format);
        assert!(config.spec_set().is_empty());
    }

    #[test]
    fn test_config_validation() {
        let config = AnonymizationConfig::default();
        assert!(config.validate().is_ok());

        let config = AnonymizationConfig {
            output_suffix: String::new(),
            ..AnonymizationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnonymizationConfig {
            output_suffix: String::new(),
            inplace: true,
            ..AnonymizationConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_spec_set_from_toml() {
        let config: AnonymizationConfig = toml::from_str(
            r#"
attr_delete = "Account_Name"
attr_val = ["euser", "egroup"]
resc_key = { foo = "bar" }
resc_val = 12
seed = 3
"#,
        )
        .unwrap();
        let specs = config.spec_set();
        assert!(specs.attr_delete.contains("Account_Name"));
        assert_eq!(specs.attr_val.len(), 2);
        assert_eq!(specs.resc_key.get("foo").unwrap().alias.as_deref(), Some("bar"));
        // a bare integer is not a usable spec
        assert!(specs.resc_val.is_empty());

        let mut anon = config.build_session();
        assert_eq!(anon.anonymize_resc_key("foo"), "bar");
    }
}
