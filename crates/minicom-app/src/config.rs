use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use minicom_types::{ChatConfig, DEFAULT_CHANNEL_NAME};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key under `directory`, shared by every instance
    File,
    /// Nothing survives the process
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub directory: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            directory: ".minicom".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub send_delay_ms: u64,
    pub typing_debounce_ms: u64,
    pub preview_length: usize,
    pub channel_name: String,
    pub broadcast_capacity: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            send_delay_ms: 600,
            typing_debounce_ms: 500,
            preview_length: 40,
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            broadcast_capacity: 1024,
        }
    }
}

impl From<&ChatSettings> for ChatConfig {
    fn from(settings: &ChatSettings) -> Self {
        ChatConfig::new()
            .with_send_delay(Duration::from_millis(settings.send_delay_ms))
            .with_typing_debounce(Duration::from_millis(settings.typing_debounce_ms))
            .with_preview_length(settings.preview_length)
            .with_channel_name(settings.channel_name.clone())
            .with_broadcast_capacity(settings.broadcast_capacity)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, e.g. `MINICOM_CHAT__SEND_DELAY_MS=1000`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("MINICOM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.chat.broadcast_capacity == 0 {
            return Err(ConfigError::Message(
                "chat.broadcast_capacity must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig::from(&self.chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [storage]
            backend = "memory"
            directory = "/tmp/minicom"

            [chat]
            send_delay_ms = 100
            typing_debounce_ms = 250
            preview_length = 20
            channel_name = "support"
            broadcast_capacity = 64

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.chat.send_delay_ms, 100);
        assert_eq!(config.logging.format, "json");

        let chat = config.chat_config();
        assert_eq!(chat.typing_debounce, Duration::from_millis(250));
        assert_eq!(chat.channel_name, "support");
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"info\"\nformat = \"pretty\"\n").unwrap();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.chat_config().send_delay, Duration::from_millis(600));
    }

    #[test]
    fn test_bundled_defaults_parse() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.chat.preview_length, 40);
        assert_eq!(config.chat.channel_name, "minicom_channel");
    }

    #[test]
    fn test_zero_broadcast_capacity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        std::fs::write(&path, "[chat]\nsend_delay_ms = 600\ntyping_debounce_ms = 500\npreview_length = 40\nchannel_name = \"minicom_channel\"\nbroadcast_capacity = 0\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broadcast_capacity"));
    }
}
