//! Engine configuration loading.
//!
//! The config file is YAML with the field names of
//! [`EngineConfig`]; every field is optional.
//!
//! ```yaml
//! traction_safety_factor: 0.85
//! lookahead_pieces: 8
//! drift_stats_policy: reset_each_lap
//! ```

use std::path::Path;

use racebot_engine::EngineConfig;
use tracing::info;

use crate::error::BotError;

/// Parses and validates a YAML config document.
pub fn parse_config(text: &str, path: &Path) -> Result<EngineConfig, BotError> {
    // An empty document deserializes to unit, not to a map.
    if text.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    let config: EngineConfig = serde_yaml::from_str(text).map_err(|source| BotError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads the engine config from `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, BotError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| BotError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text, path)?;
    info!(path = %path.display(), "Loaded engine config");
    Ok(config)
}
