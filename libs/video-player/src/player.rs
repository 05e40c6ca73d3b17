use channel_data::ChannelLine;

use crate::{AudioTrack, PlayerEventHub, SubtitleTrack, VideoTrack};

/// Render target handed over by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSurface {
    Surface(u64),
    Texture(u64),
}

/// Playback backend driven by the playback core.
///
/// Implementations report everything they observe through [`Self::events`];
/// the core never inspects backend state directly.
pub trait VideoPlayer: Send {
    fn events(&self) -> &PlayerEventHub;

    fn initialize(&mut self) {}

    /// Drop the engine and every registered listener
    fn release(&mut self) {
        self.events().stop();
        self.events().clear_listeners();
    }

    /// Load a new source. Must trigger prepared on the hub before returning.
    fn prepare(&mut self, line: &ChannelLine);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek_to(&mut self, position: i64);

    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    fn stop(&mut self) {
        self.events().stop();
    }

    fn select_video_track(&mut self, _track: Option<&VideoTrack>) {}

    fn select_audio_track(&mut self, _track: Option<&AudioTrack>) {}

    fn select_subtitle_track(&mut self, _track: Option<&SubtitleTrack>) {}

    fn attach_surface(&mut self, _surface: VideoSurface) {}
}
