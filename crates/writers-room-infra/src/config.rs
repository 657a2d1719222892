//! Room configuration loader.
//!
//! Reads `writers_room.toml` from the config directory and deserializes it
//! into [`RoomConfig`]. Falls back to defaults when the file is missing or
//! malformed. Values are not validated here: callers fold in their own
//! overrides first and validate the merged result once.

use std::path::Path;

use writers_room_types::config::RoomConfig;

pub const CONFIG_FILE: &str = "writers_room.toml";

/// Load room configuration from `{config_dir}/writers_room.toml`.
///
/// - Missing file: [`RoomConfig::default()`].
/// - Unreadable or unparsable file: warning, then the default.
/// - Parsed values are returned as written, even out-of-range ones; run
///   [`RoomConfig::validate`] after applying overrides.
pub async fn load_room_config(config_dir: &Path) -> RoomConfig {
    let config_path = config_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE} found at {}, using defaults", config_path.display());
            return RoomConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return RoomConfig::default();
        }
    };

    match toml::from_str::<RoomConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            RoomConfig::default()
        }
    }
}
