//! Integration tests for logging functionality

use pbs_anonymize::anonymization::{Anonymizer, SpecSet};
use pbs_anonymize::config::LoggingConfig;
use pbs_anonymize::formats::{FileFormat, OutputOptions};
use pbs_anonymize::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_rotation_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = LoggingConfig {
        local_enabled: true,
        local_path: temp_dir.path().join("logs").to_string_lossy().to_string(),
        local_rotation: "weekly".to_string(),
    };
    assert!(init_logging("info", &config).is_err());
    assert!(!temp_dir.path().join("logs").exists());
}

#[test]
fn test_file_layer_writes_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("nested").join("logs");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    let guard = init_logging("debug", &config).unwrap();
    assert!(log_path.is_dir());

    let mut anon = Anonymizer::with_seed(SpecSet::default(), 1);
    let missing = temp_dir.path().join("missing-input");
    assert!(anon
        .rewrite_file(FileFormat::Kv, &missing, &OutputOptions::default())
        .is_none());
    drop(guard);

    let content = std::fs::read_to_string(log_path.join("pbs-anonymize.log")).unwrap();
    let entry = content
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .find(|entry| entry["fields"]["message"] == "File not rewritten")
        .unwrap();
    assert_eq!(entry["level"], "ERROR");
    assert_eq!(entry["fields"]["format"], "kv");
}
