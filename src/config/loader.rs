use std::io::ErrorKind;
use std::path::Path;

use super::{BridgeConfig, ConfigError};

/// Read and parse a YAML config file.
///
/// A missing file maps to `NotFound`. A file with nothing but whitespace or
/// comments is rejected instead of silently yielding an all-default config.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BridgeConfig, ConfigError> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
        _ => ConfigError::Io(e),
    })?;

    let has_content = content
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with('#'));
    if !has_content {
        return Err(ConfigError::Validation(format!("{} is empty", path.display())));
    }

    let config = serde_yaml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loaded GPU bridge config");
    Ok(config)
}
