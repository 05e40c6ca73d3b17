use serde::{Deserialize, Serialize};

/// Stream metadata reported by a backend once a source is loaded
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub video: Option<VideoTrack>,
    pub audio: Option<AudioTrack>,
    pub video_tracks: Vec<VideoTrack>,
    pub audio_tracks: Vec<AudioTrack>,
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        *self == Metadata::default()
    }
}

/// Video track. Equality ignores index, selection and decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoTrack {
    pub index: Option<i32>,
    pub is_selected: Option<bool>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub color: Option<String>,
    pub frame_rate: Option<f32>,
    pub bitrate: Option<u64>,
    pub mime_type: Option<String>,
    pub decoder: Option<String>,
}

impl PartialEq for VideoTrack {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.frame_rate == other.frame_rate
            && self.bitrate == other.bitrate
            && self.mime_type == other.mime_type
    }
}

impl VideoTrack {
    /// e.g. `1920x1080, 25fps, 4.00 Mbps`
    pub fn short_label(&self) -> String {
        let mut parts = vec![format!(
            "{}x{}",
            opt_to_string(self.width),
            opt_to_string(self.height)
        )];
        if let Some(fps) = self.frame_rate.filter(|fps| *fps > 0.0) {
            parts.push(format!("{}fps", fps.round() as i64));
        }
        if let Some(bitrate) = self.bitrate.filter(|b| *b > 0) {
            parts.push(humanize_bitrate(bitrate));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioTrack {
    pub index: Option<i32>,
    pub is_selected: Option<bool>,
    pub channels: Option<u32>,
    pub channels_label: Option<String>,
    pub sample_rate: Option<u32>,
    pub bitrate: Option<u64>,
    pub mime_type: Option<String>,
    pub language: Option<String>,
    pub decoder: Option<String>,
}

impl PartialEq for AudioTrack {
    fn eq(&self, other: &Self) -> bool {
        self.channels == other.channels
            && self.sample_rate == other.sample_rate
            && self.bitrate == other.bitrate
            && self.mime_type == other.mime_type
            && self.language == other.language
    }
}

impl AudioTrack {
    pub fn short_label(&self) -> String {
        let channels = self
            .channels_label
            .clone()
            .or_else(|| self.channels.map(humanize_audio_channels));
        [
            channels,
            self.bitrate.filter(|b| *b > 0).map(humanize_bitrate),
            self.language.clone(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub index: Option<i32>,
    pub is_selected: Option<bool>,
    pub bitrate: Option<u64>,
    pub mime_type: Option<String>,
    pub language: Option<String>,
}

impl PartialEq for SubtitleTrack {
    fn eq(&self, other: &Self) -> bool {
        self.bitrate == other.bitrate
            && self.mime_type == other.mime_type
            && self.language == other.language
    }
}

impl SubtitleTrack {
    pub fn short_label(&self) -> String {
        self.language.clone().unwrap_or_default()
    }
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
}

pub fn humanize_bitrate(bitrate: u64) -> String {
    match bitrate {
        b if b >= 1_000_000 => format!("{:.2} Mbps", b as f64 / 1_000_000.0),
        b if b >= 1_000 => format!("{:.1} Kbps", b as f64 / 1_000.0),
        b => format!("{b} bps"),
    }
}

pub fn humanize_audio_channels(channels: u32) -> String {
    match channels {
        1 => "mono".to_string(),
        2 => "stereo".to_string(),
        6 => "5.1".to_string(),
        8 => "7.1".to_string(),
        n => format!("{n} channels"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_track_equality_ignores_selection() {
        let a = VideoTrack {
            index: Some(0),
            is_selected: Some(true),
            width: Some(1920),
            height: Some(1080),
            decoder: Some("hevc_mediacodec".to_string()),
            ..Default::default()
        };
        let b = VideoTrack {
            index: Some(3),
            is_selected: Some(false),
            width: Some(1920),
            height: Some(1080),
            ..Default::default()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_labels() {
        let video = VideoTrack {
            width: Some(1920),
            height: Some(1080),
            frame_rate: Some(25.0),
            bitrate: Some(4_000_000),
            ..Default::default()
        };
        assert_eq!(video.short_label(), "1920x1080, 25fps, 4.00 Mbps");

        let audio = AudioTrack {
            channels: Some(2),
            bitrate: Some(128_000),
            language: Some("zh".to_string()),
            ..Default::default()
        };
        assert_eq!(audio.short_label(), "stereo, 128.0 Kbps, zh");
    }

    #[test]
    fn test_default_metadata_is_empty() {
        assert!(Metadata::default().is_empty());
        let metadata = Metadata {
            video: Some(VideoTrack::default()),
            ..Default::default()
        };
        assert!(!metadata.is_empty());
    }
}
