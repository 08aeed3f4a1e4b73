//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "hast.toml";

/// Loads and validates a `hast.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `hast.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.transformer.default_max_degree_of_parallelism == 0 {
        return Err(ConfigError::ValidationError(
            "transformer.default_max_degree_of_parallelism must be at least 1".to_string(),
        ));
    }
    for (prefix, member) in &config.members {
        if member.max_degree_of_parallelism == Some(0) {
            return Err(ConfigError::ValidationError(format!(
                "members.\"{prefix}\".max_degree_of_parallelism must be at least 1"
            )));
        }
    }
    for code in config
        .diagnostics
        .deny
        .iter()
        .chain(&config.diagnostics.allow)
    {
        if !is_diagnostic_code(code) {
            return Err(ConfigError::ValidationError(format!(
                "'{code}' is not a diagnostic code (expected e.g. \"W001\")"
            )));
        }
    }
    Ok(())
}

/// `E`, `W` or `C` followed by three digits.
fn is_diagnostic_code(code: &str) -> bool {
    let mut chars = code.chars();
    matches!(chars.next(), Some('E' | 'W' | 'C'))
        && code.len() == 4
        && chars.all(|c| c.is_ascii_digit())
}
