use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::engine::CanvasEngine;
use crate::error::CanvasError;
use crate::types::Config;

/// Overrides the config location when set.
pub const CONFIG_ENV: &str = "BRIEFOS_CONFIG";

/// Process-wide state shared by the driver and the CLI.
pub struct AppState {
    pub config: Config,
    pub engine: Mutex<CanvasEngine>,
}

impl AppState {
    pub fn new() -> Self {
        let config = match load_config() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}. Using default configuration.", e);
                Config::default()
            }
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            engine: Mutex::new(CanvasEngine::new(config.clone())),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the config file path ($BRIEFOS_CONFIG or ~/.briefos/config.json)
pub fn config_path() -> Result<PathBuf, CanvasError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| CanvasError::ConfigurationError("Could not find home directory".to_string()))?;
    Ok(home.join(".briefos").join("config.json"))
}

/// Load configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config, CanvasError> {
    let path = config_path()?;
    match load_config_from(&path) {
        Err(e) if e.is_recoverable() => {
            log::warn!("{}", e);
            Ok(Config::default())
        }
        other => other,
    }
}

/// Load and validate configuration from a specific file.
pub fn load_config_from(path: &Path) -> Result<Config, CanvasError> {
    if !path.exists() {
        return Err(CanvasError::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Reject timing values the reveal loop cannot run with.
pub fn validate_config(config: &Config) -> Result<(), CanvasError> {
    let timing = &config.timing;
    for (name, value) in [
        ("charTickMs", timing.char_tick_ms),
        ("chatTickMs", timing.chat_tick_ms),
    ] {
        if value == 0 {
            return Err(CanvasError::InvalidTiming(format!("{} must be greater than zero", name)));
        }
    }
    if config.user_name.trim().is_empty() {
        return Err(CanvasError::ConfigurationError("userName must not be empty".to_string()));
    }
    Ok(())
}

/// Write configuration, creating the parent directory if needed.
pub fn save_config(path: &Path, config: &Config) -> Result<(), CanvasError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, CanvasError::ConfigNotFound(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, CanvasError::ParseError(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "userName": "EO Tirumala", "timing": { "charTickMs": 5 } }"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.user_name, "EO Tirumala");
        assert_eq!(config.timing.char_tick_ms, 5);
        assert_eq!(config.timing.settle_ms, 400);
        assert_eq!(config.timezone, "Asia/Kolkata");
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "timing": { "chatTickMs": 0 } }"#).unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidTiming(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            rng_seed: Some(9),
            ..Config::default()
        };
        save_config(&path, &config).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.rng_seed, Some(9));
        assert_eq!(loaded.timing, config.timing);
    }

    #[test]
    fn test_app_state_uses_given_config() {
        let config = Config {
            user_name: "Deputy EO".to_string(),
            ..Config::default()
        };
        let state = AppState::with_config(config);
        assert_eq!(state.engine.lock().config().user_name, "Deputy EO");
    }
}
