//! Application configuration: a TOML file layered over the engine's
//! defaults. A missing file is not an error; defaults apply.

use promptcast_engines::EngineDescriptor;
use promptcast_foundation::AppError;
use promptcast_injection::InjectionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "promptcast.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine tuning; every field has a default.
    #[serde(default)]
    pub injection: InjectionConfig,

    /// Extra or overriding engine descriptors, merged over the builtin
    /// table (configuration wins on a name collision).
    #[serde(default)]
    pub engines: Vec<EngineDescriptor>,

    /// Execution history JSONL file. `None` disables history.
    #[serde(default)]
    pub history_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load an explicit path (must exist), or the default path if present,
    /// or fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
            history_path = "history.jsonl"

            [injection]
            max_attempts = 5

            [[engines]]
            name = "local"
            base_url = "http://localhost:8080/"
            input_selector = "#composer"
            submit_selector = "#send-btn"
            settle_delay_ms = 100
            "##
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.injection.max_attempts, 5);
        assert_eq!(config.injection.retry_backoff_ms, 1000);
        assert_eq!(config.engines.len(), 1);
        assert_eq!(config.engines[0].name, "local");
        assert_eq!(config.history_path.as_deref(), Some(Path::new("history.jsonl")));
    }

    #[test]
    fn missing_default_path_yields_defaults() {
        let config = AppConfig::load_or_default(None).unwrap();
        assert_eq!(config.injection.max_attempts, 3);
        assert!(config.engines.is_empty());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = AppConfig::load_or_default(Some(Path::new("/definitely/not/here.toml")));
        assert!(err.is_err());
    }
}
