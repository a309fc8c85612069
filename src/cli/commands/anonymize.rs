//! Anonymize command implementation
//!
//! Rewrites every given file with one session, so a name gets the same
//! pseudonym in all of them.

use crate::anonymization::audit::AuditLogger;
use crate::anonymization::spec::RawSpec;
use crate::anonymization::RunReport;
use crate::config::{load_config_or_default, AnonymizeConfig};
use crate::formats::{FileFormat, OutputOptions};
use crate::{log_error_with_context, log_rewrite_complete, log_rewrite_start};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Input format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Fixed-width report with a dash rule under the header
    Tabular,
    /// Free text with key=value pairs
    Kv,
    /// Accounting log
    Accounting,
    /// Fairshare resource_group file
    ResourceGroup,
    /// sched_config
    SchedConfig,
    /// JSON array of attribute objects
    Records,
}

impl From<FormatArg> for FileFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Tabular => FileFormat::Tabular,
            FormatArg::Kv => FileFormat::Kv,
            FormatArg::Accounting => FileFormat::Accounting,
            FormatArg::ResourceGroup => FileFormat::ResourceGroup,
            FormatArg::SchedConfig => FileFormat::SchedConfig,
            FormatArg::Records => FileFormat::Records,
        }
    }
}

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Format of the input files
    #[arg(short, long, value_enum)]
    pub format: FormatArg,

    /// Files to rewrite
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Attributes to delete (comma-separated)
    #[arg(long, value_name = "NAMES")]
    pub attr_delete: Option<String>,

    /// Resources to delete (comma-separated)
    #[arg(long, value_name = "NAMES")]
    pub resc_delete: Option<String>,

    /// Attributes whose names are anonymized (comma-separated)
    #[arg(long, value_name = "NAMES")]
    pub attr_key: Option<String>,

    /// Attributes whose values are anonymized (comma-separated)
    #[arg(long, value_name = "NAMES")]
    pub attr_val: Option<String>,

    /// Resources whose names are anonymized (comma-separated)
    #[arg(long, value_name = "NAMES")]
    pub resc_key: Option<String>,

    /// Resources whose values are anonymized (comma-separated)
    #[arg(long, value_name = "NAMES")]
    pub resc_val: Option<String>,

    /// Suffix for rewritten files
    #[arg(long)]
    pub suffix: Option<String>,

    /// Overwrite the input files
    #[arg(long)]
    pub inplace: bool,

    /// Seed for reproducible pseudonyms
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the pseudonym tables as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub dump_map: Option<PathBuf>,

    /// Print the pseudonym tables after the run
    #[arg(long)]
    pub print_map: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let anonymization = &config.anonymization;
        let audit = match AuditLogger::new(
            anonymization.audit.log_path.clone(),
            anonymization.audit.json_format,
            anonymization.audit.enabled,
        ) {
            Ok(logger) => logger,
            Err(e) => {
                eprintln!("Failed to open audit log: {e:#}");
                return Ok(2);
            }
        };

        let format = FileFormat::from(self.format);
        let options = OutputOptions {
            suffix: anonymization.output_suffix.clone(),
            inplace: anonymization.inplace,
        };
        let mut session = anonymization.build_session();
        if session.specs().is_empty() {
            tracing::warn!("No specifications configured, files are copied unchanged");
        }

        tracing::info!(files = self.files.len(), format = %format, "Starting anonymization");

        let mut report = RunReport::new();
        for path in &self.files {
            log_rewrite_start!(path.display(), format);
            match session.rewrite_path(format, path, &options) {
                Ok(done) => {
                    log_rewrite_complete!(done.output.display(), done.report.stats);
                    if let Err(e) = audit.log_rewrite(&done.report, &done.input_sha256) {
                        tracing::warn!(error = %e, "Failed to write audit entry");
                    }
                    if format == FileFormat::Records {
                        report.records_rewritten += done.report.stats.lines_written;
                    }
                    report.add_file(done.report);
                }
                Err(e) => {
                    log_error_with_context!(e, "File not rewritten");
                    report.add_failure(path.display().to_string(), e.to_string());
                }
            }
        }
        report.mapping_entries = session.store().len();

        if let Some(path) = &anonymization.mapping_dump {
            if let Err(e) = session.write_mapping_dump(path) {
                tracing::error!(error = %e, "Failed to write mapping dump");
                eprintln!("Failed to write mapping dump: {e}");
                return Ok(5); // Fatal error exit code
            }
        }

        if self.print_map {
            println!("{}", session.describe(anonymization.hash_originals));
        }

        if self.json {
            println!("{}", report.format_json()?);
        } else {
            print!("{}", report.format_console());
        }

        if report.is_clean() {
            Ok(0)
        } else if report.files.is_empty() {
            Ok(5)
        } else {
            Ok(1) // Partial success
        }
    }

    /// Command-line settings win over the configuration file
    fn apply_overrides(&self, config: &mut AnonymizeConfig) {
        let anonymization = &mut config.anonymization;
        let specs = [
            (&self.attr_delete, &mut anonymization.attr_delete),
            (&self.resc_delete, &mut anonymization.resc_delete),
            (&self.attr_key, &mut anonymization.attr_key),
            (&self.attr_val, &mut anonymization.attr_val),
            (&self.resc_key, &mut anonymization.resc_key),
            (&self.resc_val, &mut anonymization.resc_val),
        ];
        for (arg, slot) in specs {
            if let Some(names) = arg {
                *slot = Some(RawSpec::Text(names.clone()));
            }
        }

        if let Some(suffix) = &self.suffix {
            anonymization.output_suffix = suffix.clone();
        }
        if self.inplace {
            anonymization.inplace = true;
        }
        if let Some(seed) = self.seed {
            anonymization.seed = Some(seed);
        }
        if let Some(path) = &self.dump_map {
            anonymization.mapping_dump = Some(path.clone());
        }
    }
}
