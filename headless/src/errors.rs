use live_playback::SettingsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeadlessError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid channel snapshot: {0}")]
    SnapshotError(#[from] serde_json::Error),
    #[error("Settings error: {0}")]
    SettingsError(#[from] SettingsError),
    #[error("Logger error: {0}")]
    LoggerError(#[from] log::SetLoggerError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}, try `help`")]
    Unknown(String),
    #[error("Missing argument for `{0}`")]
    MissingArgument(&'static str),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}
