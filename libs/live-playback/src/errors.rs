use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    DecodeError(#[from] toml::de::Error),
    #[error("Failed to encode settings: {0}")]
    EncodeError(#[from] toml::ser::Error),
    #[error("No config directory on this platform")]
    NoConfigDir,
}
