//! Settings file discovery and loading

use std::fs;
use std::path::{Path, PathBuf};

use super::StyleSettings;
use crate::error::SharpfixError;
use crate::result::Result;

/// File names probed in each directory, in priority order
pub const SETTINGS_FILE_NAMES: [&str; 3] = [".sharpfix.json", ".sharpfix.jsonc", ".sharpfix.toml"];

/// Loader for discovering and decoding settings files
pub struct SettingsLoader;

impl SettingsLoader {
    /// Auto-discover a settings file by traversing upward from `start_path`
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| SharpfixError::io_error(start_path, e))?;

        loop {
            for filename in SETTINGS_FILE_NAMES {
                let candidate = current.join(filename);
                if candidate.is_file() {
                    tracing::debug!("Found settings: {}", candidate.display());
                    return Ok(Some(candidate));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load settings from a specific file
    ///
    /// `.json`/`.jsonc` files are read as JSONC (comments and trailing
    /// commas allowed); `.toml` files as TOML.
    pub fn load_from_file(path: &Path) -> Result<StyleSettings> {
        let content = fs::read_to_string(path).map_err(|e| SharpfixError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        match ext {
            Some("json") | Some("jsonc") => Self::parse_jsonc(&content)
                .map_err(|message| SharpfixError::invalid_config_file(path, message)),
            Some("toml") => toml::from_str(&content)
                .map_err(|e| SharpfixError::invalid_config_file(path, e.to_string())),
            _ => Err(SharpfixError::invalid_config_file(
                path,
                "unsupported file extension (expected .json, .jsonc or .toml)",
            )),
        }
    }

    /// Decode JSONC text
    pub fn parse_jsonc(content: &str) -> std::result::Result<StyleSettings, String> {
        json5::from_str(content).map_err(|e| e.to_string())
    }

    /// Load explicit settings, or discover them, or fall back to defaults
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<StyleSettings> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(SharpfixError::config_error(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No settings file found, using defaults");
                Ok(StyleSettings::default())
            }
        }
    }

    /// JSON schema describing the settings file
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(StyleSettings);
        serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null)
    }
}
