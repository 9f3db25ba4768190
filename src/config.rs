use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::camera::{CameraConstraints, Facing};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Colour scheme preference. Has no bearing on submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: String,
    pub model: String,
    /// Base URL of the Gemini REST API, without trailing slash.
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub camera_index: i32,
    pub facing: Facing,
    pub theme: Theme,
    pub default_subject: String,
    /// Set when the key came from the environment; such a key is never saved.
    #[serde(skip)]
    pub api_key_from_env: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            model: "gemini-1.5-flash-latest".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            request_timeout_secs: 60,
            camera_index: 0,
            facing: Facing::Environment,
            theme: Theme::System,
            default_subject: "General".into(),
            api_key_from_env: false,
        }
    }
}

impl Config {
    /// Directory: ~/.config/brainbox/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("brainbox");
        p
    }

    fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk, returning defaults if file doesn't exist or is invalid,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let path = Self::path();
        let config = match fs::read_to_string(&path) {
            Ok(data) => Self::from_json(&data),
            Err(_) => Self::default(),
        };
        config.with_env_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Parse a stored config, falling back to defaults when it is invalid.
    pub fn from_json(data: &str) -> Self {
        serde_json::from_str(data).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid config: {e}");
            Self::default()
        })
    }

    /// Prefer a non-empty key from the environment over the stored one.
    pub fn with_env_key(mut self, env_key: Option<String>) -> Self {
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            self.gemini_api_key = key.trim().to_string();
            self.api_key_from_env = true;
        }
        self
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let dir = Self::dir();
        fs::create_dir_all(&dir)?;
        fs::write(Self::path(), self.to_json()?)?;
        Ok(())
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut stored = self.clone();
        if stored.api_key_from_env {
            stored.gemini_api_key.clear();
        }
        serde_json::to_string_pretty(&stored)
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn camera_constraints(&self) -> CameraConstraints {
        CameraConstraints {
            facing: self.facing,
            device_index: self.camera_index,
            ..CameraConstraints::default()
        }
    }
}
