//! Configuration loading and schema definitions.

pub mod schema;

pub use schema::*;

use std::path::Path;

use anyhow::{Context, Result};

/// Loads railgun configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - The configuration doesn't match the expected schema
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Loads railgun configuration from a TOML string.
///
/// Useful for testing or generating configuration programmatically.
///
/// # Example
///
/// ```
/// use railgun::config::load_config_str;
///
/// let config = load_config_str(r#"
///     [testrail]
///     url = "https://example.testrail.net"
///     project = "Test Project"
///     milestone = "0.1"
///     suite = "Test Suite"
///     plan = "Plan name"
/// "#)?;
///
/// assert_eq!(config.testrail.project, "Test Project");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    Ok(config)
}
