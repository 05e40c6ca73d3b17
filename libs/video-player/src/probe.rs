//! Headless backend that "plays" a line by probing it with ffprobe.
//!
//! Nothing is rendered. A successful probe is reported as ready with the
//! stream metadata, a failed one as an error event, so the playback core
//! can drive line failover against real sources.

use std::path::{Path, PathBuf};

use channel_data::ChannelLine;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::errors::VideoPlayerError;
use crate::{AudioTrack, Metadata, PlayerEventHub, SubtitleTrack, VideoPlayer, VideoTrack};

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;
#[cfg(target_os = "windows")]
#[allow(unused_imports)]
use std::os::windows::process::CommandExt;

pub fn default_ffprobe_path() -> PathBuf {
    let mut path = Path::new("ffprobe").to_path_buf();
    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}

/// What a successful probe tells about a source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeInfo {
    pub metadata: Metadata,
    /// Milliseconds, absent for live streams
    pub duration: Option<i64>,
}

pub struct FfprobePlayer {
    events: PlayerEventHub,
    runtime: Handle,
    ffprobe: PathBuf,
    user_agent: Option<String>,
    probe_task: Option<JoinHandle<()>>,
    volume: f32,
    is_playing: bool,
}

impl FfprobePlayer {
    pub fn new(events: PlayerEventHub, runtime: Handle) -> Self {
        Self {
            events,
            runtime,
            ffprobe: default_ffprobe_path(),
            user_agent: None,
            probe_task: None,
            volume: 1.0,
            is_playing: false,
        }
    }

    pub fn with_ffprobe(mut self, ffprobe: impl Into<PathBuf>) -> Self {
        self.ffprobe = ffprobe.into();
        self
    }

    /// User agent for lines that do not carry their own
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn abort_probe(&mut self) {
        if let Some(task) = self.probe_task.take() {
            task.abort();
        }
    }

    fn probe_args(&self, line: &ChannelLine) -> Vec<String> {
        let mut args: Vec<String> = [
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        // microseconds
        let rw_timeout = self.events.load_timeout().as_micros();
        args.push("-rw_timeout".to_string());
        args.push(rw_timeout.to_string());

        if let Some(user_agent) = line.http_user_agent.as_ref().or(self.user_agent.as_ref()) {
            args.push("-user_agent".to_string());
            args.push(user_agent.clone());
        }
        if let Some(referrer) = &line.http_referrer {
            // ffmpeg expects CRLF after each header
            args.push("-headers".to_string());
            args.push(format!("Referer: {referrer}\r\n"));
        }

        args.push(line.playable_url().to_string());
        args
    }

    fn set_playing(&mut self, is_playing: bool) {
        if self.is_playing != is_playing {
            self.is_playing = is_playing;
            self.events.trigger_is_playing_changed(is_playing);
        }
    }
}

impl VideoPlayer for FfprobePlayer {
    fn events(&self) -> &PlayerEventHub {
        &self.events
    }

    fn release(&mut self) {
        self.abort_probe();
        self.events.stop();
        self.events.clear_listeners();
    }

    fn prepare(&mut self, line: &ChannelLine) {
        self.abort_probe();
        self.events.trigger_prepared();

        let args = self.probe_args(line);
        let ffprobe = self.ffprobe.clone();
        let events = self.events.clone();
        let url = line.playable_url().to_string();
        log::info!("Probe line: {}", url);

        self.probe_task = Some(self.runtime.spawn(async move {
            match probe(&ffprobe, &args).await {
                Ok(info) => {
                    log::info!("Probe succeeded: {}", url);
                    if let Some(video) = &info.metadata.video {
                        if let (Some(width), Some(height)) = (video.width, video.height) {
                            events.trigger_resolution(width, height);
                        }
                    }
                    events.trigger_metadata(info.metadata);
                    events.trigger_ready();
                    events.trigger_buffering(false);
                    if let Some(duration) = info.duration {
                        events.trigger_duration(duration);
                    }
                }
                Err(e) => {
                    log::error!("Probe failed for {}: {}", url, e);
                    events.trigger_error(e.to_playback_exception());
                }
            }
        }));
    }

    fn play(&mut self) {
        self.set_playing(true);
    }

    fn pause(&mut self) {
        self.set_playing(false);
    }

    fn seek_to(&mut self, position: i64) {
        self.events.trigger_current_position(position);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn stop(&mut self) {
        self.abort_probe();
        self.set_playing(false);
        self.events.stop();
    }
}

impl Drop for FfprobePlayer {
    fn drop(&mut self) {
        self.abort_probe();
    }
}

async fn probe(ffprobe: &Path, args: &[String]) -> Result<ProbeInfo, VideoPlayerError> {
    let mut ffprobe_process = tokio::process::Command::new(ffprobe);
    #[cfg(target_os = "windows")]
    ffprobe_process.creation_flags(CREATE_NO_WINDOW);

    let output = ffprobe_process
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(VideoPlayerError::ProbeFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output
pub fn parse_probe_output(json_str: &str) -> Result<ProbeInfo, VideoPlayerError> {
    let json: serde_json::Value = serde_json::from_str(json_str)?;
    let streams = json["streams"].as_array().ok_or(VideoPlayerError::NoStream)?;

    let mut metadata = Metadata::default();
    for (index, stream) in streams.iter().enumerate() {
        let index = Some(index as i32);
        let codec_name = stream["codec_name"].as_str().map(str::to_owned);
        let bitrate = str_number::<u64>(&stream["bit_rate"]);
        let language = stream["tags"]["language"].as_str().map(str::to_owned);

        match stream["codec_type"].as_str().unwrap_or("") {
            "video" => metadata.video_tracks.push(VideoTrack {
                index,
                is_selected: None,
                width: stream["width"].as_u64().map(|w| w as u32),
                height: stream["height"].as_u64().map(|h| h as u32),
                color: stream["pix_fmt"].as_str().map(str::to_owned),
                frame_rate: stream["r_frame_rate"].as_str().and_then(parse_frame_rate),
                bitrate,
                mime_type: codec_name,
                decoder: None,
            }),
            "audio" => metadata.audio_tracks.push(AudioTrack {
                index,
                is_selected: None,
                channels: stream["channels"].as_u64().map(|c| c as u32),
                channels_label: stream["channel_layout"].as_str().map(str::to_owned),
                sample_rate: str_number::<u32>(&stream["sample_rate"]),
                bitrate,
                mime_type: codec_name,
                language,
                decoder: None,
            }),
            "subtitle" => metadata.subtitle_tracks.push(SubtitleTrack {
                index,
                is_selected: None,
                bitrate,
                mime_type: codec_name,
                language,
            }),
            _ => {}
        }
    }

    if metadata.video_tracks.is_empty() && metadata.audio_tracks.is_empty() {
        return Err(VideoPlayerError::NoStream);
    }

    // ffmpeg's default stream selection picks the first of each type
    if let Some(track) = metadata.video_tracks.first_mut() {
        track.is_selected = Some(true);
        metadata.video = Some(track.clone());
    }
    if let Some(track) = metadata.audio_tracks.first_mut() {
        track.is_selected = Some(true);
        metadata.audio = Some(track.clone());
    }

    let duration = str_number::<f64>(&json["format"]["duration"])
        .filter(|d| *d > 0.0)
        .map(|d| (d * 1000.0) as i64);

    Ok(ProbeInfo { metadata, duration })
}

fn str_number<T: std::str::FromStr>(value: &serde_json::Value) -> Option<T> {
    value.as_str().and_then(|s| s.parse::<T>().ok())
}

/// `30000/1001` -> 29.97
fn parse_frame_rate(rate: &str) -> Option<f32> {
    let (num, den) = rate.split_once('/')?;
    let num = num.parse::<f32>().ok()?;
    let den = den.parse::<f32>().ok()?;
    if den == 0.0 || num == 0.0 {
        return None;
    }
    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventKind, PlaybackException, PlayerEvent, TokioScheduler};
    use std::sync::Arc;
    use std::time::Duration;

    const LIVE_TS: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "pix_fmt": "yuv420p",
                "r_frame_rate": "25/1"
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2,
                "channel_layout": "stereo",
                "bit_rate": "128000",
                "tags": { "language": "chi" }
            },
            {
                "index": 2,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 6,
                "tags": { "language": "eng" }
            }
        ],
        "format": {
            "format_name": "mpegts",
            "duration": "N/A"
        }
    }"#;

    #[test]
    fn test_parse_live_stream() {
        let info = parse_probe_output(LIVE_TS).unwrap();
        assert_eq!(info.duration, None);

        let video = info.metadata.video.as_ref().unwrap();
        assert_eq!(video.width, Some(1920));
        assert_eq!(video.height, Some(1080));
        assert_eq!(video.frame_rate, Some(25.0));
        assert_eq!(video.is_selected, Some(true));

        assert_eq!(info.metadata.audio_tracks.len(), 2);
        let audio = info.metadata.audio.as_ref().unwrap();
        assert_eq!(audio.sample_rate, Some(48000));
        assert_eq!(audio.short_label(), "stereo, 128.0 Kbps, chi");
        assert_eq!(info.metadata.audio_tracks[1].is_selected, None);
    }

    #[test]
    fn test_parse_duration() {
        let info = parse_probe_output(
            r#"{"streams":[{"codec_type":"audio","codec_name":"mp3"}],"format":{"duration":"12.5"}}"#,
        )
        .unwrap();
        assert_eq!(info.duration, Some(12_500));
        assert!(info.metadata.video.is_none());
    }

    #[test]
    fn test_parse_without_streams() {
        assert!(matches!(
            parse_probe_output(r#"{"streams":[]}"#),
            Err(VideoPlayerError::NoStream)
        ));
        assert!(matches!(
            parse_probe_output(r#"{"format":{}}"#),
            Err(VideoPlayerError::NoStream)
        ));
        assert!(matches!(
            parse_probe_output("not json"),
            Err(VideoPlayerError::InvalidProbeOutput(_))
        ));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[tokio::test]
    async fn test_prepare_reports_probe_args() {
        let hub = PlayerEventHub::with_load_timeout(
            Arc::new(TokioScheduler::current()),
            Duration::from_secs(3),
        );
        let player = FfprobePlayer::new(hub, Handle::current()).with_user_agent("okhttp");
        let line = ChannelLine::new("http://example.com/live.m3u8");
        let args = player.probe_args(&line);
        assert_eq!(args.last().map(String::as_str), Some("http://example.com/live.m3u8"));
        assert!(args.windows(2).any(|w| w[0] == "-rw_timeout" && w[1] == "3000000"));
        assert!(args.windows(2).any(|w| w[0] == "-user_agent" && w[1] == "okhttp"));
    }

    #[tokio::test]
    async fn test_missing_ffprobe_reports_error() {
        let _ = env_logger::try_init();
        let hub = PlayerEventHub::new(Arc::new(TokioScheduler::current()));
        let mut rx = hub.subscribe();
        let mut player = FfprobePlayer::new(hub, Handle::current())
            .with_ffprobe("/nonexistent/ffprobe-for-test");

        player.prepare(&ChannelLine::new("http://127.0.0.1:1/live.m3u8"));
        assert_eq!(rx.recv().await, Some(PlayerEvent::Prepared));

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.kind(), EventKind::Error);
        assert_eq!(
            event,
            PlayerEvent::Error(PlaybackException::new("FFPROBE_SPAWN_FAILED", -1))
        );
        player.release();
    }
}
