//! Validate config command implementation
//!
//! Loads the configuration, validates it and shows the normalized
//! specifications.

use crate::anonymization::Spec;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let anonymization = &config.anonymization;
        let specs = anonymization.spec_set();

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Attributes deleted: {}", summarize(&specs.attr_delete));
        println!("  Resources deleted: {}", summarize(&specs.resc_delete));
        println!("  Attribute names anonymized: {}", summarize(&specs.attr_key));
        println!("  Attribute values anonymized: {}", summarize(&specs.attr_val));
        println!("  Resource names anonymized: {}", summarize(&specs.resc_key));
        println!("  Resource values anonymized: {}", summarize(&specs.resc_val));
        if anonymization.inplace {
            println!("  Output: in place");
        } else {
            println!("  Output: <file>{}", anonymization.output_suffix);
        }
        match anonymization.seed {
            Some(seed) => println!("  Seed: {seed}"),
            None => println!("  Seed: random"),
        }
        if let Some(path) = &anonymization.mapping_dump {
            println!("  Mapping dump: {}", path.display());
        }
        println!(
            "  Audit log: {}",
            if anonymization.audit.enabled {
                anonymization.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();

        if specs.is_empty() {
            println!("⚠️  No specifications configured: files would be copied unchanged");
            println!();
        }

        Ok(0)
    }
}

/// Names of a spec, or `none`
fn summarize(spec: &Spec) -> String {
    if spec.is_empty() {
        "none".to_string()
    } else {
        spec.names().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&Spec::new()), "none");
        assert_eq!(summarize(&Spec::from_names(["euser", "egroup"])), "egroup, euser");
    }

    #[test]
    fn test_validate_missing_file() {
        let code = ValidateArgs {}.execute("missing-config.toml").unwrap();
        assert_eq!(code, 2);
    }

    #[test]
    fn test_validate_good_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[anonymization]\nattr_val = \"euser\"\n")
            .unwrap();
        file.flush().unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert_eq!(ValidateArgs {}.execute(&path).unwrap(), 0);
    }
}
