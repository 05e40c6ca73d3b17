pub mod errors;
pub mod events;
pub mod hub;
pub mod metadata;
pub mod player;
pub mod probe;
pub mod scheduler;

// Re-export main types
pub use errors::{PlaybackException, VideoPlayerError};
pub use events::{EventKind, PlayerEvent};
pub use hub::{PlayerEventHub, Subscription, DEFAULT_LOAD_TIMEOUT};
pub use metadata::{AudioTrack, Metadata, SubtitleTrack, VideoTrack};
pub use player::{VideoPlayer, VideoSurface};
pub use probe::FfprobePlayer;
pub use scheduler::{Scheduler, TimerHandle, TimerTask, TokioScheduler};
