pub mod controller;
pub mod errors;
pub mod line_selector;
pub mod navigator;
pub mod settings;

// Re-export main types
pub use controller::{
    ControllerOptions, PlaybackController, ReserveToggle, DEFAULT_OVERLAY_HIDE_DELAY,
};
pub use errors::SettingsError;
pub use line_selector::select_line_idx;
pub use navigator::{next_channel, prev_channel, NavigationPolicy};
pub use settings::{FileSettingsStore, MemorySettingsStore, PlaybackSettings, SettingsStore};
