use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Client-side settings: where the backend lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
    #[serde(default)]
    pub cost_saver: bool,
    #[serde(default)]
    pub custom_instruction: String,
    #[serde(default = "default_persona")]
    pub default_persona: String,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_persona() -> String {
    crate::persona::DEFAULT_PERSONA_ID.to_string()
}

fn mentorx_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".mentorx")
}

pub fn config_json_path() -> PathBuf {
    mentorx_dir().join("config.json")
}

pub fn parse_bool_env(value: &str) -> bool {
    let flag = value.trim().to_ascii_lowercase();
    matches!(flag.as_str(), "1" | "true" | "yes" | "y" | "on")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_timeout_secs(),
            stream_idle_timeout_secs: default_timeout_secs(),
            cost_saver: false,
            custom_instruction: String::new(),
            default_persona: default_persona(),
        }
    }
}

impl ClientConfig {
    /// `~/.mentorx/config.json` when present, then environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_path(&config_json_path()).unwrap_or_default();
        config.apply_env_overrides();
        config
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                log::warn!("Failed to read {}: {}", path.display(), error);
                return None;
            }
        };
        match serde_json::from_str::<ClientConfig>(&content) {
            Ok(config) => Some(config),
            Err(error) => {
                log::warn!("Ignoring malformed config {}: {}", path.display(), error);
                None
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MENTORX_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Ok(timeout) = std::env::var("MENTORX_TIMEOUT_SECS") {
            match timeout.trim().parse() {
                Ok(secs) => {
                    self.request_timeout_secs = secs;
                    self.stream_idle_timeout_secs = secs;
                }
                Err(_) => log::warn!("Ignoring invalid MENTORX_TIMEOUT_SECS={timeout}"),
            }
        }
        if let Ok(cost_saver) = std::env::var("MENTORX_COST_SAVER") {
            self.cost_saver = parse_bool_env(&cost_saver);
        }
        if let Ok(instruction) = std::env::var("MENTORX_CUSTOM_INSTRUCTION") {
            self.custom_instruction = instruction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flags_accept_common_spellings() {
        let on: Vec<bool> = ["1", "TRUE", " yes ", "Y", "on"].map(parse_bool_env).to_vec();
        let off: Vec<bool> = ["0", "false", "nope", "off", "", "  "].map(parse_bool_env).to_vec();
        assert!(on.iter().all(|flag| *flag));
        assert!(off.iter().all(|flag| !*flag));
    }

    #[test]
    fn from_path_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend_url": "http://example.test", "cost_saver": true}"#)
            .unwrap();

        let config = ClientConfig::from_path(&path).unwrap();

        assert_eq!(config.backend_url, "http://example.test");
        assert!(config.cost_saver);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.default_persona, "default");
    }

    #[test]
    fn from_path_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(ClientConfig::from_path(&path).is_none());
        assert!(ClientConfig::from_path(&dir.path().join("missing.json")).is_none());
    }
}
