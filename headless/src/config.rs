use std::path::{Path, PathBuf};

use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use simplelog::LevelFilter;

use live_playback::settings::APP_NAME;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Channel snapshot JSON, `{ "groups": [...], "favorites": [...] }`
    #[serde(default = "default_channels")]
    pub channels: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_overlay_hide_delay_ms")]
    pub overlay_hide_delay_ms: u64,
    /// Sent for lines without their own user agent
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_channels() -> String {
    config_dir()
        .map(|dir| dir.join("channels.json"))
        .unwrap_or_else(|| PathBuf::from("channels.json"))
        .to_string_lossy()
        .into_owned()
}

fn default_ffprobe() -> String {
    video_player::probe::default_ffprobe_path()
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_overlay_hide_delay_ms() -> u64 {
    live_playback::DEFAULT_OVERLAY_HIDE_DELAY.as_millis() as u64
}

fn config_dir() -> Option<PathBuf> {
    AppDirs::new(Some(APP_NAME), false).map(|dirs| dirs.config_dir)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            ffprobe: default_ffprobe(),
            log_level: default_log_level(),
            overlay_hide_delay_ms: default_overlay_hide_delay_ms(),
            user_agent: None,
            config_path: PathBuf::from("Conf.toml"),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        config_dir()
            .map(|dir| dir.join("Conf.toml"))
            .unwrap_or_else(|| PathBuf::from("Conf.toml"))
    }

    /// Read the config at `path`, or write defaults there when it is missing
    /// or unreadable
    pub fn load(path: Option<PathBuf>) -> Self {
        let config_path = path.unwrap_or_else(Self::default_path);
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(mut config) = toml::from_str::<Config>(&content) {
                config.config_path = config_path;
                return config;
            }
        }

        let config = Config {
            config_path,
            ..Default::default()
        };
        if let Err(e) = config.save() {
            eprintln!(
                "Failed to write default config to {}: {}",
                config.config_path.display(),
                e
            );
        }
        config
    }

    pub fn save(&self) -> std::io::Result<()> {
        let content = toml::to_string(&self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, content)
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Conf.toml");

        let config = Config::load(Some(path.clone()));
        assert!(path.exists());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.overlay_hide_delay_ms, 1500);
        assert_eq!(config.path(), path.as_path());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Conf.toml");
        std::fs::write(&path, "log_level = \"debug\"\nuser_agent = \"okhttp/3.12\"\n").unwrap();

        let config = Config::load(Some(path));
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert_eq!(config.user_agent.as_deref(), Some("okhttp/3.12"));
        assert_eq!(config.ffprobe, default_ffprobe());
    }

    #[test]
    fn test_invalid_log_level_falls_back() {
        let config = Config {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }
}
