//! Loader for the worker settings file.

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::WorkerConfig;
use std::path::Path;

/// Loads worker settings from a TOML file.
///
/// # Arguments
///
/// * `path` - Location of the settings file
///
/// # Returns
///
/// The parsed [`WorkerConfig`]. If the file does not exist, returns the
/// default configuration rather than an error, so a worker can run
/// without any settings file at all.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file has invalid TOML syntax
/// - A value fails validation (e.g. an empty `process_types` list)
pub fn load_worker_config(path: &Path) -> ConfigResult<WorkerConfig> {
    if !path.exists() {
        return Ok(WorkerConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config: WorkerConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })?;

    validate(path, &config)?;

    Ok(config)
}

fn validate(path: &Path, config: &WorkerConfig) -> ConfigResult<()> {
    if let Some(process_types) = &config.process_types {
        if process_types.is_empty() {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: "process_types must name at least one process type when set".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_protocol::ProcessTypeId;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_worker_config_missing_file_is_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("worker.toml");

        let config = load_worker_config(&path).expect("Should handle missing file");

        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn test_load_worker_config_full_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("worker.toml");

        let content = r#"
state_file = "var/steps-state.json"
log_filter = "sk_core=debug"
process_types = ["MAILING", "IDENTITY_PROVIDER_DELETION"]
"#;
        fs::write(&path, content).expect("Failed to write config file");

        let config = load_worker_config(&path).expect("Failed to load config");

        assert_eq!(
            config.state_file.as_deref(),
            Some(Path::new("var/steps-state.json"))
        );
        assert_eq!(config.log_filter.as_deref(), Some("sk_core=debug"));
        assert_eq!(
            config.process_types,
            Some(vec![
                ProcessTypeId::Mailing,
                ProcessTypeId::IdentityProviderDeletion,
            ])
        );
    }

    #[test]
    fn test_load_worker_config_partial_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("worker.toml");

        fs::write(&path, "log_filter = \"warn\"").expect("Failed to write config file");

        let config = load_worker_config(&path).expect("Failed to load config");

        assert_eq!(config.log_filter.as_deref(), Some("warn"));
        assert!(config.state_file.is_none());
        assert!(config.process_types.is_none());
    }

    #[test]
    fn test_load_worker_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("worker.toml");

        fs::write(&path, "state_file = [broken").expect("Failed to write config file");

        let result = load_worker_config(&path);

        if let Err(ConfigError::TomlParse { path: err_path, .. }) = result {
            assert!(err_path.ends_with("worker.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[test]
    fn test_load_worker_config_unknown_process_type() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("worker.toml");

        fs::write(&path, "process_types = [\"NOT_A_TYPE\"]").expect("Failed to write config file");

        let result = load_worker_config(&path);
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[test]
    fn test_load_worker_config_empty_process_types_rejected() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("worker.toml");

        fs::write(&path, "process_types = []").expect("Failed to write config file");

        let result = load_worker_config(&path);

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("process_types"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }
}
