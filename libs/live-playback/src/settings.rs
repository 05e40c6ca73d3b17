use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use channel_data::{Channel, EpgProgrammeReserveList};
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

pub const APP_NAME: &str = "mytv";
pub const SETTINGS_FILE: &str = "Playback.toml";

/// Persisted playback state shared with the settings screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub favorite_list_visible: bool,
    pub change_list_loop: bool,
    pub load_timeout_ms: u64,
    /// Line URLs that reached ready before
    pub playable_urls: BTreeSet<String>,
    pub playable_hosts: BTreeSet<String>,
    pub reserve_list: EpgProgrammeReserveList,
    pub last_play_channel: Option<Channel>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            favorite_list_visible: true,
            change_list_loop: false,
            load_timeout_ms: 15_000,
            playable_urls: BTreeSet::new(),
            playable_hosts: BTreeSet::new(),
            reserve_list: Vec::new(),
            last_play_channel: None,
        }
    }
}

impl PlaybackSettings {
    pub fn mark_playable(&mut self, url: &str, host: String) {
        self.playable_urls.insert(url.to_string());
        if !host.is_empty() {
            self.playable_hosts.insert(host);
        }
    }

    pub fn evict_playable(&mut self, url: &str, host: &str) {
        self.playable_urls.remove(url);
        self.playable_hosts.remove(host);
    }
}

/// Read-modify-write access to [`PlaybackSettings`]. Last write wins.
pub trait SettingsStore: Send {
    fn settings(&self) -> &PlaybackSettings;

    fn update<F: FnOnce(&mut PlaybackSettings)>(&mut self, f: F);
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    settings: PlaybackSettings,
}

impl MemorySettingsStore {
    pub fn new(settings: PlaybackSettings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    fn update<F: FnOnce(&mut PlaybackSettings)>(&mut self, f: F) {
        f(&mut self.settings);
    }
}

/// Settings kept in a TOML file, written back after every update
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    settings: PlaybackSettings,
}

impl FileSettingsStore {
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let app_dirs = AppDirs::new(Some(APP_NAME), false).ok_or(SettingsError::NoConfigDir)?;
        Ok(app_dirs.config_dir.join(SETTINGS_FILE))
    }

    pub fn open_default() -> Result<Self, SettingsError> {
        Self::open(Self::default_path()?)
    }

    /// A missing file starts from defaults, an unreadable one is an error
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let settings = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                PlaybackSettings::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, settings })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let content = toml::to_string(&self.settings)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    fn update<F: FnOnce(&mut PlaybackSettings)>(&mut self, f: F) {
        f(&mut self.settings);
        if let Err(e) = self.save() {
            log::error!("Failed to save settings to {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_data::{ChannelLine, EpgProgramme, EpgProgrammeReserve};

    #[test]
    fn test_defaults() {
        let settings = PlaybackSettings::default();
        assert!(settings.favorite_list_visible);
        assert!(!settings.change_list_loop);
        assert_eq!(settings.load_timeout_ms, 15_000);
        assert!(settings.last_play_channel.is_none());
    }

    #[test]
    fn test_mark_playable_skips_empty_host() {
        let mut settings = PlaybackSettings::default();
        let line = ChannelLine::new("not a url");
        settings.mark_playable(&line.url, line.host());
        assert!(settings.playable_urls.contains("not a url"));
        assert!(settings.playable_hosts.is_empty());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::open(dir.path().join("missing.toml")).unwrap();
        assert_eq!(*store.settings(), PlaybackSettings::default());
    }

    #[test]
    fn test_updates_are_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let channel = Channel::new(
            "CCTV-1",
            vec![
                ChannelLine::new("http://a.example.com/1.m3u8").with_user_agent("okhttp"),
                ChannelLine::new("http://b.example.com/1.m3u8"),
            ],
        );
        let programme = EpgProgramme::new("News", 1_700_000_000_000, 1_700_001_800_000);

        let mut store = FileSettingsStore::open(&path).unwrap();
        store.update(|s| {
            s.change_list_loop = true;
            s.mark_playable("http://a.example.com/1.m3u8", "a.example.com".to_string());
            s.reserve_list.push(EpgProgrammeReserve::new(&channel, &programme));
            s.last_play_channel = Some(channel.clone());
        });
        assert!(path.exists());

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.settings(), store.settings());
        assert_eq!(reopened.settings().last_play_channel.as_ref(), Some(&channel));
        assert!(reopened.settings().playable_hosts.contains("a.example.com"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "load_timeout_ms = \"soon\"").unwrap();
        assert!(matches!(
            FileSettingsStore::open(&path),
            Err(SettingsError::DecodeError(_))
        ));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "change_list_loop = true\n").unwrap();
        let store = FileSettingsStore::open(&path).unwrap();
        assert!(store.settings().change_list_loop);
        assert!(store.settings().favorite_list_visible);
    }
}
