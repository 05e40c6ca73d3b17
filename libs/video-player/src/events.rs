use crate::{Metadata, PlaybackException};

/// Events a player backend reports for its current source
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The source is loaded and can render
    Ready,
    /// A new source was accepted and is loading asynchronously
    Prepared,
    Error(PlaybackException),
    Buffering(bool),
    Resolution {
        width: u32,
        height: u32,
    },
    IsPlayingChanged(bool),
    /// Duration in milliseconds
    DurationChanged(i64),
    /// Playback position in milliseconds
    PositionChanged(i64),
    MetadataChanged(Metadata),
    /// Position stopped advancing for a whole timeout window
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Prepared,
    Error,
    Buffering,
    Resolution,
    IsPlayingChanged,
    DurationChanged,
    PositionChanged,
    MetadataChanged,
    Interrupted,
}

impl PlayerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlayerEvent::Ready => EventKind::Ready,
            PlayerEvent::Prepared => EventKind::Prepared,
            PlayerEvent::Error(_) => EventKind::Error,
            PlayerEvent::Buffering(_) => EventKind::Buffering,
            PlayerEvent::Resolution { .. } => EventKind::Resolution,
            PlayerEvent::IsPlayingChanged(_) => EventKind::IsPlayingChanged,
            PlayerEvent::DurationChanged(_) => EventKind::DurationChanged,
            PlayerEvent::PositionChanged(_) => EventKind::PositionChanged,
            PlayerEvent::MetadataChanged(_) => EventKind::MetadataChanged,
            PlayerEvent::Interrupted => EventKind::Interrupted,
        }
    }
}
