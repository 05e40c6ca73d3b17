use std::path::Path;

use channel_data::{ChannelGroupList, ChannelList};
use serde::{Deserialize, Serialize};

use crate::errors::HeadlessError;

/// Parsed playlist handed to the controller as a whole
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    #[serde(default)]
    pub groups: ChannelGroupList,
    #[serde(default)]
    pub favorites: ChannelList,
}

impl ChannelSnapshot {
    pub fn load(path: &Path) -> Result<Self, HeadlessError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: ChannelSnapshot = serde_json::from_str(&content)?;
        log::info!(
            "Loaded {} groups, {} channels, {} favorites from {}",
            snapshot.groups.len(),
            snapshot.groups.channel_list().len(),
            snapshot.favorites.len(),
            path.display()
        );
        Ok(Self {
            groups: snapshot.groups.with_metadata(),
            favorites: snapshot.favorites,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        std::fs::write(
            &path,
            r#"{
                "groups": [
                    {
                        "name": "CCTV",
                        "channel_list": [
                            {"name": "CCTV-1", "line_list": [{"url": "http://a.example.com/1.m3u8"}]},
                            {"name": "CCTV-2", "line_list": [
                                {"url": "http://a.example.com/2.m3u8"},
                                {"url": "https://web.example.com/2", "hybrid_type": "WebView"}
                            ]}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        let snapshot = ChannelSnapshot::load(&path).unwrap();
        let channels = snapshot.groups.channel_list();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].index, 1);
        assert_eq!(channels[1].line_list.len(), 2);
        assert!(snapshot.favorites.is_empty());
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ChannelSnapshot::load(&dir.path().join("none.json")),
            Err(HeadlessError::IoError(_))
        ));
    }
}
