//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "pbs-anonymize.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with the attributes to scrub", self.output);
                println!("  2. Validate configuration: pbs-anonymize validate-config");
                println!("  3. Run: pbs-anonymize anonymize --format accounting <files>");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}

/// Sample configuration with every setting at its default and comments
pub fn sample_config() -> &'static str {
    r#"# pbs-anonymize configuration

[application]
# trace, debug, info, warn, error
log_level = "info"

[anonymization]
# Each specification is a comma string, a list, or a table.
# In a table, a string value names the pseudonym for a key and a nested
# table pre-seeds value pseudonyms.
attr_delete = ["Account_Name", "Variable_List"]
resc_delete = []
attr_key = []
attr_val = ["euser", "egroup", "Job_Owner", "Job_Name", "exec_host", "project"]
resc_key = {}
resc_val = []

# Rewritten files are written next to the input as <file><suffix>
output_suffix = ".anon"
inplace = false

# Uncomment for reproducible pseudonyms
# seed = 12345

# JSON dump of every original -> pseudonym pair. Keep it private.
# mapping_dump = "./pbs-anon-map.json"
hash_originals = false

[anonymization.audit]
enabled = false
log_path = "./audit/anonymize.log"
json_format = true

[logging]
local_enabled = false
local_path = "./logs"
# daily, hourly, never
local_rotation = "daily"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::tempdir;

    #[test]
    fn test_sample_config_is_valid() {
        let config = parse_config(sample_config()).unwrap();
        let specs = config.anonymization.spec_set();
        assert!(specs.attr_delete.contains("Account_Name"));
        assert!(specs.attr_val.contains("exec_host"));
        assert!(specs.resc_key.is_empty());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("pbs-anonymize.toml");
        std::fs::write(&output, "keep me").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), sample_config());
    }
}
