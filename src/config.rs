use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("settings validation failed: {0}")]
    Settings(String),
    #[error("failed to resolve home directory for state root")]
    HomeDirectoryUnavailable,
}

/// Optional `settings.yaml` under the state root. Every field has a default so
/// a missing file is a valid configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECONDS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(state_root: &Path) -> Result<Self, ConfigError> {
        let path = state_root.join("settings.yaml");
        if path.is_file() {
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::Settings(
                "default_model must be non-empty".to_string(),
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Settings(
                "request_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// State root resolution: `PAGEFORGE_STATE_ROOT` override, else `~/.pageforge`.
pub fn resolve_state_root() -> Result<PathBuf, ConfigError> {
    if let Ok(root) = std::env::var("PAGEFORGE_STATE_ROOT") {
        if !root.trim().is_empty() {
            return Ok(PathBuf::from(root));
        }
    }
    let home = std::env::var("HOME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(".pageforge"))
}

pub fn ensure_state_root(state_root: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(state_root.join("sessions")).map_err(|source| ConfigError::CreateDir {
        path: state_root.display().to_string(),
        source,
    })
}

/// API credentials, injected from the environment at startup. Absence of a key
/// is a configuration error reported when the matching provider is called.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

fn env_key(names: &[&str]) -> Option<String> {
    for name in names {
        if let Ok(value) = std::env::var(name) {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }
    None
}

impl ProviderCredentials {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_key(&["PAGEFORGE_OPENAI_API_KEY", "OPENAI_API_KEY"]),
            anthropic_api_key: env_key(&["PAGEFORGE_ANTHROPIC_API_KEY", "ANTHROPIC_API_KEY"]),
            gemini_api_key: env_key(&["PAGEFORGE_GEMINI_API_KEY", "GEMINI_API_KEY"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(dir.path()).expect("load settings");
        assert_eq!(settings.default_model, DEFAULT_MODEL);
        assert_eq!(
            settings.request_timeout_seconds,
            DEFAULT_REQUEST_TIMEOUT_SECONDS
        );
    }

    #[test]
    fn settings_file_overrides_defaults_and_is_validated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.yaml");
        let mut file = fs::File::create(&path).expect("create settings");
        writeln!(file, "default_model: gpt-4\nrequest_timeout_seconds: 30").expect("write");
        let settings = Settings::load(dir.path()).expect("load settings");
        assert_eq!(settings.default_model, "gpt-4");
        assert_eq!(settings.request_timeout_seconds, 30);

        let mut bad = fs::File::create(&path).expect("recreate settings");
        writeln!(bad, "default_model: ''").expect("write");
        assert!(Settings::load(dir.path()).is_err());
    }
}
